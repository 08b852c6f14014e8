//! Process-local store for development (`STORAGE_BACKEND=memory`) and tests.
//!
//! Tables are insertion-ordered vectors behind one lock, so every operation
//! is atomic. Unique keys, foreign keys and cascades follow the PostgreSQL
//! schema in `migrations/`.

use super::{CommentRepository, LikeRepository, PostRepository, UserRepository, VaultRepository};
use crate::error::{AppError, Result};
use crate::models::{
    Category, Comment, CommentView, Like, LikeTarget, LikedPost, NewPost, NewUser, NewVault, Page,
    Post, PostStatus, PostSummary, User, Vault, VaultWithPost,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
    vaults: Vec<Vault>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn post(&self, id: Uuid) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    fn comment(&self, id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    fn target_exists(&self, target: LikeTarget) -> bool {
        match target {
            LikeTarget::Post(id) => self.post(id).is_some(),
            LikeTarget::Comment(id) => self.comment(id).is_some(),
        }
    }

    fn require_user(&self, id: Uuid) -> Result<()> {
        self.user(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Referenced user not found".to_string()))
    }

    fn require_post(&self, id: Uuid) -> Result<()> {
        self.post(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Referenced post not found".to_string()))
    }

    fn like_count(&self, target: LikeTarget) -> i64 {
        self.likes
            .iter()
            .filter(|l| l.target() == Some(target))
            .count() as i64
    }
}

fn matches_target(like: &Like, user_id: Uuid, target: LikeTarget) -> bool {
    like.user_id == user_id && like.target() == Some(target)
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn upsert(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .users
            .iter()
            .find(|u| u.external_id == user.external_id)
        {
            return Ok(existing.clone());
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::duplicate());
        }

        let row = User {
            id: Uuid::new_v4(),
            external_id: user.external_id,
            email: user.email,
            username: user.username,
            role: Default::default(),
            created_at: Utc::now(),
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.tables.read().await.users.len() as i64)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.tables.read().await.post(id).cloned())
    }

    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.public_id == public_id)
            .cloned())
    }

    async fn insert(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        tables.require_user(post.created_by)?;
        if let Some(approver) = post.approved_by {
            tables.require_user(approver)?;
        }
        if tables.posts.iter().any(|p| p.public_id == post.public_id) {
            return Err(AppError::duplicate());
        }

        let now = Utc::now();
        let row = Post {
            id: Uuid::new_v4(),
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            public_id: post.public_id,
            category: post.category,
            status: post.status,
            created_by: post.created_by,
            approved_by: post.approved_by,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(row.clone());
        Ok(row)
    }

    async fn delete_by_public_id(&self, public_id: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(post_id) = tables
            .posts
            .iter()
            .find(|p| p.public_id == public_id)
            .map(|p| p.id)
        else {
            return Ok(false);
        };

        let comment_ids: Vec<Uuid> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.id)
            .collect();

        tables.likes.retain(|l| {
            l.post_id != Some(post_id)
                && l.comment_id.map_or(true, |id| !comment_ids.contains(&id))
        });
        tables.comments.retain(|c| c.post_id != post_id);
        for vault in tables.vaults.iter_mut() {
            if vault.post_id == Some(post_id) {
                vault.post_id = None;
            }
        }
        tables.posts.retain(|p| p.id != post_id);
        Ok(true)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: PostStatus,
        approver: Uuid,
    ) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        tables.require_user(approver)?;
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.status = status;
            post.approved_by = Some(approver);
            post.updated_at = Utc::now();
            post.clone()
        }))
    }

    async fn list_by_category(&self, category: Category) -> Result<Vec<PostSummary>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .rev()
            .filter(|p| p.category == category)
            .map(|post| PostSummary {
                creator_username: tables
                    .user(post.created_by)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
                like_count: tables.like_count(LikeTarget::Post(post.id)),
                comment_count: tables
                    .comments
                    .iter()
                    .filter(|c| c.post_id == post.id)
                    .count() as i64,
                post: post.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.tables.read().await.comment(id).cloned())
    }

    async fn list_for_post(&self, post_id: Uuid, page: Page) -> Result<Vec<CommentView>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .rev()
            .filter(|c| c.post_id == post_id)
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|comment| CommentView {
                owner_username: tables
                    .user(comment.user_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
                like_count: tables.like_count(LikeTarget::Comment(comment.id)),
                comment: comment.clone(),
            })
            .collect())
    }

    async fn insert(&self, user_id: Uuid, post_id: Uuid, text: &str) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        tables.require_user(user_id)?;
        tables.require_post(post_id)?;
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput("Comment text is required".to_string()));
        }

        let now = Utc::now();
        let row = Comment {
            id: Uuid::new_v4(),
            text: text.to_string(),
            user_id,
            post_id,
            created_at: now,
            updated_at: now,
        };
        tables.comments.push(row.clone());
        Ok(row)
    }

    async fn update_text(&self, id: Uuid, text: &str) -> Result<Option<Comment>> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput("Comment text is required".to_string()));
        }
        let mut tables = self.tables.write().await;
        Ok(tables.comments.iter_mut().find(|c| c.id == id).map(|c| {
            c.text = text.to_string();
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            return Ok(false);
        }
        tables.likes.retain(|l| l.comment_id != Some(id));
        Ok(true)
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn find(&self, user_id: Uuid, target: LikeTarget) -> Result<Option<Like>> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .iter()
            .find(|l| matches_target(l, user_id, target))
            .cloned())
    }

    async fn insert_if_absent(&self, user_id: Uuid, target: LikeTarget) -> Result<Option<Like>> {
        let mut tables = self.tables.write().await;
        tables.require_user(user_id)?;
        if !tables.target_exists(target) {
            return Err(AppError::NotFound("Referenced record not found".to_string()));
        }
        if tables
            .likes
            .iter()
            .any(|l| matches_target(l, user_id, target))
        {
            return Ok(None);
        }

        let (post_id, comment_id) = match target {
            LikeTarget::Post(id) => (Some(id), None),
            LikeTarget::Comment(id) => (None, Some(id)),
        };
        let row = Like {
            id: Uuid::new_v4(),
            user_id,
            post_id,
            comment_id,
            created_at: Utc::now(),
        };
        tables.likes.push(row.clone());
        Ok(Some(row))
    }

    async fn remove(&self, user_id: Uuid, target: LikeTarget) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.likes.len();
        tables.likes.retain(|l| !matches_target(l, user_id, target));
        Ok(tables.likes.len() != before)
    }

    async fn list_liked_posts(&self, user_id: Uuid, page: Page) -> Result<Vec<LikedPost>> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .iter()
            .rev()
            .filter(|l| l.user_id == user_id)
            .filter_map(|l| {
                let post = tables.post(l.post_id?)?;
                Some(LikedPost {
                    like_id: l.id,
                    liked_at: l.created_at,
                    post: post.clone(),
                })
            })
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect())
    }
}

#[async_trait]
impl VaultRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vault>> {
        let tables = self.tables.read().await;
        Ok(tables.vaults.iter().find(|v| v.id == id).cloned())
    }

    async fn find_with_post(&self, id: Uuid) -> Result<Option<VaultWithPost>> {
        let tables = self.tables.read().await;
        Ok(tables.vaults.iter().find(|v| v.id == id).map(|vault| VaultWithPost {
            post: vault.post_id.and_then(|post_id| tables.post(post_id).cloned()),
            vault: vault.clone(),
        }))
    }

    async fn insert(&self, vault: NewVault) -> Result<Vault> {
        let mut tables = self.tables.write().await;
        tables.require_user(vault.user_id)?;
        tables.require_post(vault.post_id)?;

        let now = Utc::now();
        let row = Vault {
            id: Uuid::new_v4(),
            name: vault.name,
            description: vault.description,
            user_id: vault.user_id,
            post_id: Some(vault.post_id),
            created_at: now,
            updated_at: now,
        };
        tables.vaults.push(row.clone());
        Ok(row)
    }

    async fn update_details(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Option<Vault>> {
        let mut tables = self.tables.write().await;
        Ok(tables.vaults.iter_mut().find(|v| v.id == id).map(|v| {
            v.name = name.to_string();
            v.description = description.to_string();
            v.updated_at = Utc::now();
            v.clone()
        }))
    }

    async fn set_post(&self, id: Uuid, post_id: Uuid) -> Result<Option<Vault>> {
        let mut tables = self.tables.write().await;
        tables.require_post(post_id)?;
        Ok(tables.vaults.iter_mut().find(|v| v.id == id).map(|v| {
            v.post_id = Some(post_id);
            v.updated_at = Utc::now();
            v.clone()
        }))
    }

    async fn clear_post(&self, id: Uuid, post_id: Uuid) -> Result<Option<Vault>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .vaults
            .iter_mut()
            .find(|v| v.id == id && v.post_id == Some(post_id))
            .map(|v| {
                v.post_id = None;
                v.updated_at = Utc::now();
                v.clone()
            }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.vaults.len();
        tables.vaults.retain(|v| v.id != id);
        Ok(tables.vaults.len() != before)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<VaultWithPost>> {
        let tables = self.tables.read().await;
        Ok(tables
            .vaults
            .iter()
            .rev()
            .filter(|v| v.user_id == user_id)
            .map(|vault| VaultWithPost {
                post: vault.post_id.and_then(|id| tables.post(id).cloned()),
                vault: vault.clone(),
            })
            .collect())
    }
}
