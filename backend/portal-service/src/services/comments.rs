/// Comment service - comment lifecycle on posts
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::ensure_owner;
use crate::models::{Actor, Comment, CommentView, Page};
use uuid::Uuid;

pub struct CommentService {
    store: Store,
}

impl CommentService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Comments on a post, newest first
    pub async fn list(&self, post_id: Uuid, page: Page) -> Result<Vec<CommentView>> {
        self.ensure_post_exists(post_id).await?;
        self.store.comments.list_for_post(post_id, page).await
    }

    pub async fn create(&self, actor: &Actor, post_id: Uuid, text: &str) -> Result<Comment> {
        let result: Result<Comment> = async {
            let text = required_text(text)?;
            self.ensure_post_exists(post_id).await?;
            self.store.comments.insert(actor.user_id, post_id, text).await
        }
        .await;

        match &result {
            Ok(comment) => tracing::info!(
                comment_id = %comment.id,
                %post_id,
                user_id = %actor.user_id,
                "comment created"
            ),
            Err(err) => metrics::record_error("create_comment", err),
        }
        result
    }

    /// Owner-only; nothing but the text changes
    pub async fn edit(&self, actor: &Actor, comment_id: Uuid, new_text: &str) -> Result<Comment> {
        let result: Result<Comment> = async {
            let text = required_text(new_text)?;
            let comment = self.find(comment_id).await?;
            ensure_owner(actor, comment.user_id, "comment")?;

            self.store
                .comments
                .update_text(comment_id, text)
                .await?
                .ok_or_else(comment_not_found)
        }
        .await;

        if let Err(err) = &result {
            metrics::record_error("edit_comment", err);
        }
        result
    }

    /// Owner-only; the comment's likes go with it
    pub async fn delete(&self, actor: &Actor, comment_id: Uuid) -> Result<()> {
        let result: Result<()> = async {
            let comment = self.find(comment_id).await?;
            ensure_owner(actor, comment.user_id, "comment")?;

            if !self.store.comments.delete(comment_id).await? {
                return Err(comment_not_found());
            }
            tracing::info!(%comment_id, user_id = %actor.user_id, "comment deleted");
            Ok(())
        }
        .await;

        if let Err(err) = &result {
            metrics::record_error("delete_comment", err);
        }
        result
    }

    async fn find(&self, comment_id: Uuid) -> Result<Comment> {
        self.store
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(comment_not_found)
    }

    async fn ensure_post_exists(&self, post_id: Uuid) -> Result<()> {
        match self.store.posts.find_by_id(post_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Post not found".to_string())),
        }
    }
}

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found".to_string())
}

fn required_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput(
            "Please provide the content of the comment!".to_string(),
        ));
    }
    Ok(text)
}
