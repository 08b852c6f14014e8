use super::PostRepository;
use crate::error::Result;
use crate::models::{Category, NewPost, Post, PostStatus, PostSummary};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub(super) const POST_COLUMNS: &str = "id, title, content, image_url, public_id, category, status, \
     created_by, approved_by, created_at, updated_at";

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE public_id = $1"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn insert(&self, post: NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (id, title, content, image_url, public_id, category, status,
                               created_by, approved_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(&post.public_id)
        .bind(post.category)
        .bind(post.status)
        .bind(post.created_by)
        .bind(post.approved_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn delete_by_public_id(&self, public_id: &str) -> Result<bool> {
        // comments/likes cascade and vault slots are SET NULL by the schema
        let result = sqlx::query("DELETE FROM posts WHERE public_id = $1")
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: PostStatus,
        approver: Uuid,
    ) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET status = $2, approved_by = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(approver)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_by_category(&self, category: Category) -> Result<Vec<PostSummary>> {
        let posts = sqlx::query_as::<_, PostSummary>(
            r#"
            SELECT p.id, p.title, p.content, p.image_url, p.public_id, p.category, p.status,
                   p.created_by, p.approved_by, p.created_at, p.updated_at,
                   u.username AS creator_username,
                   (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
                   (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
            FROM posts p
            JOIN users u ON u.id = p.created_by
            WHERE p.category = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}
