/// Configuration management for portal-service
///
/// Everything is read from environment variables (a `.env` file is loaded in
/// development by `main`).
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    pub media: MediaConfig,
    pub vaults: VaultPolicyConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process-local tables; development and tests only
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Identity provider settings
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// RSA public key (PEM) used to verify session tokens
    pub session_public_key_pem: Option<String>,
    /// Expected `iss` claim, if any
    pub session_issuer: Option<String>,
    /// `whsec_...` secret for the user registration webhook
    pub webhook_secret: Option<String>,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field(
                "session_public_key_pem",
                &self.session_public_key_pem.as_ref().map(|_| "[PEM]"),
            )
            .field("session_issuer", &self.session_issuer)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Media store (Cloudinary) settings
#[derive(Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub upload_folder: String,
    pub api_base_url: String,
    pub max_upload_bytes: usize,
}

impl MediaConfig {
    /// All credentials present
    pub fn is_configured(&self) -> bool {
        self.cloud_name.is_some() && self.api_key.is_some() && self.api_secret.is_some()
    }
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("upload_folder", &self.upload_folder)
            .field("api_base_url", &self.api_base_url)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

/// Vault mutation policy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VaultPolicyConfig {
    /// Reject rename/re-describe from anyone but the vault owner
    pub enforce_owner_on_update: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => StorageBackend::Postgres,
            "memory" if is_production => {
                return Err("STORAGE_BACKEND=memory is not allowed in production".to_string())
            }
            "memory" => StorageBackend::Memory,
            other => return Err(format!("Unknown STORAGE_BACKEND: {}", other)),
        };

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("PORTAL_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: db_pool::parse_env_with_default("PORTAL_SERVICE_PORT", 8080),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if is_production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if is_production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/jodhpur_darshan".to_string()),
                max_connections: db_pool::parse_env_with_default("DATABASE_MAX_CONNECTIONS", 10),
            },
            storage: StorageConfig {
                backend: storage_backend,
            },
            identity: IdentityConfig {
                session_public_key_pem: non_empty_env("SESSION_PUBLIC_KEY_PEM")
                    .map(|pem| pem.replace("\\n", "\n")),
                session_issuer: non_empty_env("SESSION_ISSUER"),
                webhook_secret: non_empty_env("WEBHOOK_SECRET"),
            },
            media: MediaConfig {
                cloud_name: non_empty_env("CLOUDINARY_CLOUD_NAME"),
                api_key: non_empty_env("CLOUDINARY_API_KEY"),
                api_secret: non_empty_env("CLOUDINARY_API_SECRET"),
                upload_folder: std::env::var("CLOUDINARY_UPLOAD_FOLDER")
                    .unwrap_or_else(|_| "next-cloudinary-uploads".to_string()),
                api_base_url: std::env::var("CLOUDINARY_API_BASE_URL")
                    .unwrap_or_else(|_| "https://api.cloudinary.com/v1_1".to_string()),
                max_upload_bytes: db_pool::parse_env_with_default(
                    "MEDIA_MAX_UPLOAD_BYTES",
                    10 * 1024 * 1024,
                ),
            },
            vaults: VaultPolicyConfig {
                enforce_owner_on_update: db_pool::parse_env_with_default(
                    "VAULT_ENFORCE_OWNER_ON_UPDATE",
                    false,
                ),
            },
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
