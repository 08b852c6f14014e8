/// Post service - admin publishing and public post lookups
///
/// Images live in the media store and rows in the database; the two are not
/// transactional. Upload removes the fresh image when the insert fails.
/// Delete removes the image first and logs any database failure that follows.
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::media::{MediaFile, MediaStore};
use crate::metrics;
use crate::middleware::ensure_admin;
use crate::models::{Actor, Category, NewPost, Post, PostStatus, PostSummary};
use std::sync::Arc;
use uuid::Uuid;

/// Fields of an upload form, as received
#[derive(Debug, Default)]
pub struct PostUpload {
    pub file: Option<MediaFile>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
}

pub struct PostService {
    store: Store,
    media: Arc<dyn MediaStore>,
}

impl PostService {
    pub fn new(store: Store, media: Arc<dyn MediaStore>) -> Self {
        Self { store, media }
    }

    /// Admin upload: image to the media store, then an approved post row
    pub async fn upload(&self, actor: &Actor, upload: PostUpload) -> Result<Post> {
        let result = self.upload_inner(actor, upload).await;
        if let Err(err) = &result {
            metrics::record_error("upload_post", err);
        }
        result
    }

    async fn upload_inner(&self, actor: &Actor, upload: PostUpload) -> Result<Post> {
        ensure_admin(actor)?;

        let (Some(file), Some(title), Some(content), Some(category)) = (
            upload.file.filter(|f| !f.bytes.is_empty()),
            non_blank(upload.title),
            non_blank(upload.content),
            non_blank(upload.category),
        ) else {
            return Err(AppError::InvalidInput("Missing required fields".to_string()));
        };

        let category: Category = category.parse().map_err(AppError::InvalidInput)?;

        let asset = self.media.upload(file).await?;

        let inserted = self
            .store
            .posts
            .insert(NewPost {
                title,
                content,
                image_url: asset.url,
                public_id: asset.public_id.clone(),
                category,
                status: PostStatus::Approved,
                created_by: actor.user_id,
                approved_by: Some(actor.user_id),
            })
            .await;

        match inserted {
            Ok(post) => {
                tracing::info!(
                    post_id = %post.id,
                    public_id = %post.public_id,
                    category = %post.category,
                    "post uploaded"
                );
                Ok(post)
            }
            Err(err) => {
                if let Err(cleanup) = self.media.delete(&asset.public_id).await {
                    tracing::warn!(
                        public_id = %asset.public_id,
                        error = %cleanup,
                        "failed to remove uploaded image after insert failure"
                    );
                }
                Err(err)
            }
        }
    }

    /// Admin delete by media public id
    pub async fn delete(&self, actor: &Actor, public_id: &str) -> Result<()> {
        let result: Result<()> = async {
            ensure_admin(actor)?;

            let post = self
                .store
                .posts
                .find_by_public_id(public_id)
                .await?
                .ok_or_else(post_not_found)?;

            self.media.delete(&post.public_id).await?;

            match self.store.posts.delete_by_public_id(&post.public_id).await {
                Ok(true) => {
                    tracing::info!(post_id = %post.id, %public_id, "post deleted");
                    Ok(())
                }
                Ok(false) => Err(post_not_found()),
                Err(err) => {
                    tracing::error!(
                        post_id = %post.id,
                        %public_id,
                        error = %err,
                        "image deleted but post row could not be removed"
                    );
                    Err(err)
                }
            }
        }
        .await;

        if let Err(err) = &result {
            metrics::record_error("delete_post", err);
        }
        result
    }

    /// Admin moderation; records the admin as approver
    pub async fn set_status(&self, actor: &Actor, post_id: Uuid, status: PostStatus) -> Result<Post> {
        ensure_admin(actor)?;

        let post = self
            .store
            .posts
            .set_status(post_id, status, actor.user_id)
            .await?
            .ok_or_else(post_not_found)?;

        tracing::info!(%post_id, ?status, approver = %actor.user_id, "post status updated");
        Ok(post)
    }

    pub async fn by_category(&self, category: Option<&str>) -> Result<Vec<PostSummary>> {
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::NotFound("Category not found!".to_string()))?;
        let category: Category = category.parse().map_err(AppError::InvalidInput)?;

        self.store.posts.list_by_category(category).await
    }

    pub async fn get(&self, post_id: Uuid) -> Result<Post> {
        self.store
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(post_not_found)
    }
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
