use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use crypto_core::{SessionVerifier, WebhookVerifier};
use db_pool::{create_pool, DbConfig};
use portal_service::config::{Config, StorageBackend};
use portal_service::db::{self, Store};
use portal_service::handlers;
use portal_service::media::{CloudinaryMediaStore, InMemoryMediaStore, MediaStore};
use portal_service::metrics::serve_metrics;
use portal_service::middleware::{MetricsMiddleware, SessionAuthMiddleware};
use portal_service::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", err);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn build_store(config: &Config) -> anyhow::Result<(Store, Option<sqlx::PgPool>)> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok((Store::in_memory(), None))
        }
        StorageBackend::Postgres => {
            let mut db_cfg = DbConfig::from_env(portal_service::SERVICE_NAME).unwrap_or_default();
            db_cfg.service_name = portal_service::SERVICE_NAME.to_string();
            if db_cfg.database_url.is_empty() {
                db_cfg.database_url = config.database.url.clone();
            }
            db_cfg.max_connections = db_cfg.max_connections.max(config.database.max_connections);
            db_cfg.log_config();

            let pool = create_pool(db_cfg)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            Ok((Store::postgres(pool.clone()), Some(pool)))
        }
    }
}

fn build_media(config: &Config) -> anyhow::Result<Arc<dyn MediaStore>> {
    if config.media.is_configured() {
        let store = CloudinaryMediaStore::from_config(&config.media)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        Ok(Arc::new(store))
    } else {
        if config.app.is_production() {
            anyhow::bail!("Cloudinary credentials must be set in production");
        }
        tracing::warn!("Cloudinary not configured; images are kept in memory");
        Ok(Arc::new(InMemoryMediaStore::new()))
    }
}

fn build_session_verifier(config: &Config) -> anyhow::Result<Option<SessionVerifier>> {
    let Some(pem) = config.identity.session_public_key_pem.as_deref() else {
        tracing::warn!(
            "SESSION_PUBLIC_KEY_PEM not configured; authenticated endpoints will reject every request"
        );
        return Ok(None);
    };

    let mut verifier =
        SessionVerifier::from_rsa_pem(pem).context("Invalid SESSION_PUBLIC_KEY_PEM")?;
    if let Some(issuer) = &config.identity.session_issuer {
        verifier = verifier.with_issuer(issuer.clone());
    }
    Ok(Some(verifier))
}

/// Portal Service
///
/// HTTP API of the Jodhpur Darshan portal.
///
/// # Routes
///
/// - `/api/likes/*` - Toggle likes on posts and comments, list liked posts
/// - `/api/comments*` - Comment lifecycle
/// - `/api/vault*` - Vault management
/// - `/api/post*`, `/api/getPostsByCategory` - Admin publishing and post lookups
/// - `/api/webhook/register` - Identity provider user registration
/// - `/api/user/count` - Registered user count
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Configuration loading failed")?;

    tracing::info!("Starting portal-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let (store, pool) = build_store(&config).await?;
    let media = build_media(&config)?;
    let session_verifier = build_session_verifier(&config)?;

    let mut state = AppState::new(store, media)
        .with_vault_policy(config.vaults)
        .with_max_upload_bytes(config.media.max_upload_bytes);
    match config.identity.webhook_secret.as_deref() {
        Some(secret) => {
            let verifier =
                WebhookVerifier::new(secret).context("Invalid WEBHOOK_SECRET")?;
            state = state.with_webhooks(verifier);
        }
        None => tracing::warn!("WEBHOOK_SECRET not configured; user registration webhook is disabled"),
    }
    if let Some(pool) = pool {
        state = state.with_pool(pool);
    }
    let state = web::Data::new(state);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);
        for origin in allowed_origins.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            cors = if origin == "*" {
                cors.allow_any_origin()
            } else {
                cors.allowed_origin(origin)
            };
        }

        App::new()
            .app_data(state.clone())
            .wrap(SessionAuthMiddleware::new(session_verifier.clone()))
            .wrap(MetricsMiddleware)
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(serve_metrics))
            .route("/api/v1/health", web::get().to(handlers::health))
            .route("/api/v1/health/live", web::get().to(handlers::liveness))
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    server_handle.stop(true).await;

    match server_task.await {
        Ok(result) => result.context("HTTP server error")?,
        Err(err) => tracing::error!("HTTP server task join error: {}", err),
    }

    tracing::info!("portal-service shutting down");
    Ok(())
}
