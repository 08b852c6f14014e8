/// Like service - toggles likes on posts and comments
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{Actor, Like, LikeTarget, LikedPost, Page};

/// Outcome of a toggle
#[derive(Debug, Clone, PartialEq)]
pub enum LikeToggle {
    Liked(Like),
    Unliked,
}

impl LikeToggle {
    pub fn is_liked(&self) -> bool {
        matches!(self, LikeToggle::Liked(_))
    }
}

pub struct LikeService {
    store: Store,
}

impl LikeService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Remove the actor's like on `target` if present, otherwise create it.
    ///
    /// The (user, target) unique key decides races: a conflicting insert is
    /// treated as "already liked" and reported as liked.
    pub async fn toggle(&self, actor: &Actor, target: LikeTarget) -> Result<LikeToggle> {
        let result = self.toggle_inner(actor, target).await;

        match &result {
            Ok(outcome) => {
                metrics::record_like_toggle(target.kind(), outcome.is_liked());
                tracing::info!(
                    user_id = %actor.user_id,
                    target = target.kind(),
                    target_id = %target.id(),
                    liked = outcome.is_liked(),
                    "like toggled"
                );
            }
            Err(err) => metrics::record_error("toggle_like", err),
        }

        result
    }

    async fn toggle_inner(&self, actor: &Actor, target: LikeTarget) -> Result<LikeToggle> {
        self.ensure_target_exists(target).await?;

        if self.store.likes.remove(actor.user_id, target).await? {
            return Ok(LikeToggle::Unliked);
        }

        if let Some(like) = self.store.likes.insert_if_absent(actor.user_id, target).await? {
            return Ok(LikeToggle::Liked(like));
        }

        // Lost an insert race against a concurrent like from the same user
        match self.store.likes.find(actor.user_id, target).await? {
            Some(existing) => Ok(LikeToggle::Liked(existing)),
            None => Ok(LikeToggle::Unliked),
        }
    }

    async fn ensure_target_exists(&self, target: LikeTarget) -> Result<()> {
        let exists = match target {
            LikeTarget::Post(id) => self.store.posts.find_by_id(id).await?.is_some(),
            LikeTarget::Comment(id) => self.store.comments.find_by_id(id).await?.is_some(),
        };

        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound(match target {
                LikeTarget::Post(_) => "Post not found".to_string(),
                LikeTarget::Comment(_) => "Comment not found".to_string(),
            }))
        }
    }

    /// Posts liked by the actor, newest like first; an empty page is NotFound
    pub async fn liked_posts(&self, actor: &Actor, page: Page) -> Result<Vec<LikedPost>> {
        let posts = self
            .store
            .likes
            .list_liked_posts(actor.user_id, page)
            .await
            .map_err(|err| {
                metrics::record_error("list_liked_posts", &err);
                err
            })?;

        if posts.is_empty() {
            return Err(AppError::NotFound("No liked posts found!".to_string()));
        }

        Ok(posts)
    }
}
