/// Business logic layer for portal-service
///
/// Services are cheap to build (a cloned [`Store`](crate::db::Store)) and
/// are constructed per request by the handlers. Every mutating call takes
/// the resolved [`Actor`](crate::models::Actor) explicitly.
pub mod comments;
pub mod likes;
pub mod posts;
pub mod users;
pub mod vaults;

pub use comments::CommentService;
pub use likes::{LikeService, LikeToggle};
pub use posts::{PostService, PostUpload};
pub use users::{ProviderEmail, ProviderUser, UserService, WebhookEvent};
pub use vaults::VaultService;
