use super::LikeRepository;
use crate::error::Result;
use crate::models::{Like, LikeTarget, LikedPost, Page};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const LIKE_COLUMNS: &str = "id, user_id, post_id, comment_id, created_at";

/// Column holding the target id; exactly one is non-null per row
fn target_column(target: LikeTarget) -> &'static str {
    match target {
        LikeTarget::Post(_) => "post_id",
        LikeTarget::Comment(_) => "comment_id",
    }
}

#[derive(Clone)]
pub struct PgLikeRepository {
    pool: PgPool,
}

impl PgLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for PgLikeRepository {
    async fn find(&self, user_id: Uuid, target: LikeTarget) -> Result<Option<Like>> {
        let column = target_column(target);
        let like = sqlx::query_as::<_, Like>(&format!(
            "SELECT {LIKE_COLUMNS} FROM likes WHERE user_id = $1 AND {column} = $2"
        ))
        .bind(user_id)
        .bind(target.id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(like)
    }

    async fn insert_if_absent(&self, user_id: Uuid, target: LikeTarget) -> Result<Option<Like>> {
        // The unique constraint arbitrates concurrent likes; the loser gets no row back.
        let column = target_column(target);
        let like = sqlx::query_as::<_, Like>(&format!(
            r#"
            INSERT INTO likes (id, user_id, {column})
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, {column}) DO NOTHING
            RETURNING {LIKE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(target.id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(like)
    }

    async fn remove(&self, user_id: Uuid, target: LikeTarget) -> Result<bool> {
        let column = target_column(target);
        let result = sqlx::query(&format!(
            "DELETE FROM likes WHERE user_id = $1 AND {column} = $2"
        ))
        .bind(user_id)
        .bind(target.id())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_liked_posts(&self, user_id: Uuid, page: Page) -> Result<Vec<LikedPost>> {
        let posts = sqlx::query_as::<_, LikedPost>(
            r#"
            SELECT l.id AS like_id, l.created_at AS liked_at,
                   p.id, p.title, p.content, p.image_url, p.public_id, p.category, p.status,
                   p.created_by, p.approved_by, p.created_at, p.updated_at
            FROM likes l
            JOIN posts p ON p.id = l.post_id
            WHERE l.user_id = $1
            ORDER BY l.created_at DESC, l.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}
