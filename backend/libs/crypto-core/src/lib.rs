//! Identity-provider crypto shared by portal services.
//!
//! - [`session`]: RS256 validation of provider-issued session tokens
//! - [`webhook`]: signature checks for provider webhook deliveries

pub mod session;
pub mod webhook;

#[cfg(any(test, feature = "test-keys"))]
pub mod test_keys;

pub use session::{SessionClaims, SessionMetadata, SessionSigner, SessionVerifier};
pub use webhook::{WebhookError, WebhookHeaders, WebhookVerifier};
