/// Database access layer
///
/// One async repository trait per aggregate. `Pg*Repository` types run
/// against PostgreSQL; [`memory::MemoryStore`] implements every trait over
/// process-local tables with the same constraint and cascade behaviour.
pub mod comment_repo;
pub mod like_repo;
pub mod memory;
pub mod post_repo;
pub mod user_repo;
pub mod vault_repo;

use crate::error::Result;
use crate::models::{
    Category, Comment, CommentView, Like, LikeTarget, LikedPost, NewPost, NewUser, NewVault, Page,
    Post, PostStatus, PostSummary, User, Vault, VaultWithPost,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub use comment_repo::PgCommentRepository;
pub use like_repo::PgLikeRepository;
pub use memory::MemoryStore;
pub use post_repo::PgPostRepository;
pub use user_repo::PgUserRepository;
pub use vault_repo::PgVaultRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>>;

    /// Insert, or return the existing row for the same external id
    async fn upsert(&self, user: NewUser) -> Result<User>;

    async fn count(&self) -> Result<i64>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>>;

    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Post>>;

    async fn insert(&self, post: NewPost) -> Result<Post>;

    /// Cascades to comments and likes; clears vault slots holding the post
    async fn delete_by_public_id(&self, public_id: &str) -> Result<bool>;

    async fn set_status(
        &self,
        id: Uuid,
        status: PostStatus,
        approver: Uuid,
    ) -> Result<Option<Post>>;

    async fn list_by_category(&self, category: Category) -> Result<Vec<PostSummary>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>>;

    /// Newest first
    async fn list_for_post(&self, post_id: Uuid, page: Page) -> Result<Vec<CommentView>>;

    async fn insert(&self, user_id: Uuid, post_id: Uuid, text: &str) -> Result<Comment>;

    /// Only `text` and `updated_at` change
    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Comment>>;

    /// Cascades to the comment's likes
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn find(&self, user_id: Uuid, target: LikeTarget) -> Result<Option<Like>>;

    /// Returns `None` when the (user, target) pair already exists
    async fn insert_if_absent(&self, user_id: Uuid, target: LikeTarget) -> Result<Option<Like>>;

    /// Returns whether a row was removed
    async fn remove(&self, user_id: Uuid, target: LikeTarget) -> Result<bool>;

    /// Posts the user liked, newest like first
    async fn list_liked_posts(&self, user_id: Uuid, page: Page) -> Result<Vec<LikedPost>>;
}

#[async_trait]
pub trait VaultRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vault>>;

    /// Vault plus the post in its slot, if any
    async fn find_with_post(&self, id: Uuid) -> Result<Option<VaultWithPost>>;

    async fn insert(&self, vault: NewVault) -> Result<Vault>;

    async fn update_details(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Option<Vault>>;

    /// Overwrite the single post slot
    async fn set_post(&self, id: Uuid, post_id: Uuid) -> Result<Option<Vault>>;

    /// Clear the slot only while it still holds `post_id`
    async fn clear_post(&self, id: Uuid, post_id: Uuid) -> Result<Option<Vault>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<VaultWithPost>>;
}

/// Repository handles shared by services
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub vaults: Arc<dyn VaultRepository>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            likes: Arc::new(PgLikeRepository::new(pool.clone())),
            vaults: Arc::new(PgVaultRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    pub fn from_memory(memory: MemoryStore) -> Self {
        let memory = Arc::new(memory);
        Self {
            users: memory.clone(),
            posts: memory.clone(),
            comments: memory.clone(),
            likes: memory.clone(),
            vaults: memory,
        }
    }
}

/// Run the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed successfully");
    Ok(())
}
