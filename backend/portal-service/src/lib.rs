/// Portal Service Library
///
/// Backend of the Jodhpur Darshan tourism portal: curated posts about the
/// city, and the like / comment / vault interactions users have with them.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `services`: Business logic (likes, comments, vaults, posts, users)
/// - `db`: Repository traits with PostgreSQL and in-memory implementations
/// - `media`: Image storage (Cloudinary, in-memory)
/// - `middleware`: Session authentication, ownership/admin guards, request metrics
/// - `models`: Rows, view types and shared value types
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors and the `/metrics` handler
/// - `state`: Shared application state
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;

/// Name used for pool metric labels and db-pool env lookups
pub const SERVICE_NAME: &str = "portal-service";
