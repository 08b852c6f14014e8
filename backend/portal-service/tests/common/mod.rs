//! Shared fixtures for portal-service integration tests
//!
//! Everything runs against the in-memory store and media store; session
//! tokens are signed with the RSA test key pair from crypto-core.
#![allow(dead_code, unused_macros)]

use chrono::Duration;
use crypto_core::test_keys::{TEST_PRIVATE_KEY, TEST_PUBLIC_KEY};
use crypto_core::{SessionClaims, SessionSigner, SessionVerifier, WebhookVerifier};
use portal_service::db::Store;
use portal_service::media::InMemoryMediaStore;
use portal_service::models::{Actor, Category, NewPost, NewUser, Post, PostStatus, Role, User};
use portal_service::AppState;
use std::sync::Arc;

pub const WEBHOOK_SECRET: &str = "whsec_am9kaHB1ci1kYXJzaGFuLXdlYmhvb2stc2VjcmV0";

/// Build an initialized actix test service for a [`TestContext`]
macro_rules! portal_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.state()))
                .wrap(portal_service::middleware::SessionAuthMiddleware::new(Some(
                    $ctx.verifier(),
                )))
                .configure(portal_service::handlers::configure),
        )
        .await
    };
}

pub struct TestContext {
    pub store: Store,
    pub media: InMemoryMediaStore,
    signer: SessionSigner,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            store: Store::in_memory(),
            media: InMemoryMediaStore::new(),
            signer: SessionSigner::from_rsa_pem(TEST_PRIVATE_KEY).expect("test signing key"),
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.store.clone(), Arc::new(self.media.clone()))
            .with_webhooks(WebhookVerifier::new(WEBHOOK_SECRET).expect("test webhook secret"))
    }

    pub fn verifier(&self) -> SessionVerifier {
        SessionVerifier::from_rsa_pem(TEST_PUBLIC_KEY).expect("test verification key")
    }

    pub async fn user(&self, external_id: &str) -> User {
        self.store
            .users
            .upsert(NewUser {
                external_id: external_id.to_string(),
                email: format!("{}@example.com", external_id),
                username: external_id.to_string(),
            })
            .await
            .expect("seed user")
    }

    pub fn actor(user: &User) -> Actor {
        Actor {
            user_id: user.id,
            role: Role::User,
        }
    }

    pub fn token(&self, external_id: &str) -> String {
        self.signer
            .sign(&SessionClaims::new(external_id, Duration::minutes(10)))
            .expect("sign session")
    }

    pub fn admin_token(&self, external_id: &str) -> String {
        self.signer
            .sign(&SessionClaims::new(external_id, Duration::minutes(10)).with_role("admin"))
            .expect("sign admin session")
    }

    pub async fn post(&self, creator: &User, title: &str) -> Post {
        self.store
            .posts
            .insert(NewPost {
                title: title.to_string(),
                content: format!("{} in the blue city", title),
                image_url: format!("https://img.example/{}.jpg", title),
                public_id: format!("uploads/{}", title.to_lowercase().replace(' ', "-")),
                category: Category::Landmarks,
                status: PostStatus::Approved,
                created_by: creator.id,
                approved_by: Some(creator.id),
            })
            .await
            .expect("seed post")
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
