use crate::config::VaultPolicyConfig;
use crate::db::Store;
use crate::media::MediaStore;
use crypto_core::WebhookVerifier;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state handed to every handler via `web::Data`
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub media: Arc<dyn MediaStore>,
    /// `None` when no webhook secret is configured; registration is then refused
    pub webhooks: Option<WebhookVerifier>,
    pub vault_policy: VaultPolicyConfig,
    pub max_upload_bytes: usize,
    /// Present only for the postgres backend; used by the health check
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(store: Store, media: Arc<dyn MediaStore>) -> Self {
        Self {
            store,
            media,
            webhooks: None,
            vault_policy: VaultPolicyConfig::default(),
            max_upload_bytes: 10 * 1024 * 1024,
            pool: None,
        }
    }

    pub fn with_webhooks(mut self, verifier: WebhookVerifier) -> Self {
        self.webhooks = Some(verifier);
        self
    }

    pub fn with_vault_policy(mut self, policy: VaultPolicyConfig) -> Self {
        self.vault_policy = policy;
        self
    }

    pub fn with_max_upload_bytes(mut self, max: usize) -> Self {
        self.max_upload_bytes = max;
        self
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}
