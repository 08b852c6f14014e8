/// HTTP middleware for portal-service
///
/// Session tokens issued by the identity provider are verified once per
/// request and stored in request extensions. Handlers ask for a [`Session`]
/// (verified claims) or an [`Actor`] (claims resolved to a local user).
pub mod permissions;

pub use permissions::*;

use crate::error::AppError;
use crate::metrics;
use crate::models::Actor;
use crate::state::AppState;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use crypto_core::{SessionClaims, SessionVerifier};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

/// Cookie the provider's frontend SDK keeps the session token in
pub const SESSION_COOKIE: &str = "__session";

// =====================================================================
// Session authentication
// =====================================================================

/// Verified session claims stored in request extensions after auth.
#[derive(Debug, Clone)]
pub struct Session(pub SessionClaims);

/// Verifies the session token when one is sent.
///
/// Requests without a token pass through untouched so public routes keep
/// working; a token that fails verification is rejected with 401.
#[derive(Clone)]
pub struct SessionAuthMiddleware {
    verifier: Option<Arc<SessionVerifier>>,
}

impl SessionAuthMiddleware {
    pub fn new(verifier: Option<SessionVerifier>) -> Self {
        Self {
            verifier: verifier.map(Arc::new),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct SessionAuthMiddlewareService<S> {
    service: Rc<S>,
    verifier: Option<Arc<SessionVerifier>>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();

        Box::pin(async move {
            if let Some(token) = session_token(req.request()) {
                let Some(verifier) = verifier else {
                    tracing::warn!("session token received but no verification key is configured");
                    return Err(AppError::Unauthenticated("Unauthorized".to_string()).into());
                };

                let claims = verifier.verify(&token).map_err(|e| {
                    tracing::debug!(error = %e, "session token rejected");
                    AppError::Unauthenticated("Invalid or expired session".to_string())
                })?;

                req.extensions_mut().insert(Session(claims));
            }

            service.call(req).await
        })
    }
}

/// Bearer token first, then the session cookie
fn session_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        req.cookie(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

impl FromRequest for Session {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Session>()
                .cloned()
                .ok_or_else(|| AppError::Unauthenticated("Unauthorized".to_string())),
        )
    }
}

/// Resolves the session subject to a local user; the role comes from the
/// session claim.
impl FromRequest for Actor {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req.extensions().get::<Session>().cloned();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let Session(claims) =
                session.ok_or_else(|| AppError::Unauthenticated("Unauthorized".to_string()))?;
            let state = state
                .ok_or_else(|| AppError::Internal("application state not configured".to_string()))?;

            let user = state
                .store
                .users
                .find_by_external_id(&claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthenticated("User not found!".to_string()))?;

            Ok(Actor {
                user_id: user.id,
                role: role_from_claims(&claims),
            })
        })
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();
            let status = match &res {
                Ok(response) => response.status().as_u16(),
                Err(err) => err.as_response_error().status_code().as_u16(),
            };

            metrics::observe_request(&method, status, elapsed.as_secs_f64());
            tracing::debug!(%method, %path, status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
            res
        })
    }
}
