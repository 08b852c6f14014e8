use super::post_repo::POST_COLUMNS;
use super::VaultRepository;
use crate::error::Result;
use crate::models::{NewVault, Post, Vault, VaultWithPost};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const VAULT_COLUMNS: &str = "id, name, description, user_id, post_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgVaultRepository {
    pool: PgPool,
}

impl PgVaultRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VaultRepository for PgVaultRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vault>> {
        let vault = sqlx::query_as::<_, Vault>(&format!(
            "SELECT {VAULT_COLUMNS} FROM vaults WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vault)
    }

    async fn find_with_post(&self, id: Uuid) -> Result<Option<VaultWithPost>> {
        let Some(vault) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let post = match vault.post_id {
            Some(post_id) => {
                sqlx::query_as::<_, Post>(&format!(
                    "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
                ))
                .bind(post_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        Ok(Some(VaultWithPost { vault, post }))
    }

    async fn insert(&self, vault: NewVault) -> Result<Vault> {
        let vault = sqlx::query_as::<_, Vault>(&format!(
            r#"
            INSERT INTO vaults (id, name, description, user_id, post_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {VAULT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&vault.name)
        .bind(&vault.description)
        .bind(vault.user_id)
        .bind(vault.post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(vault)
    }

    async fn update_details(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Option<Vault>> {
        let vault = sqlx::query_as::<_, Vault>(&format!(
            r#"
            UPDATE vaults
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {VAULT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vault)
    }

    async fn set_post(&self, id: Uuid, post_id: Uuid) -> Result<Option<Vault>> {
        let vault = sqlx::query_as::<_, Vault>(&format!(
            r#"
            UPDATE vaults
            SET post_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {VAULT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vault)
    }

    async fn clear_post(&self, id: Uuid, post_id: Uuid) -> Result<Option<Vault>> {
        let vault = sqlx::query_as::<_, Vault>(&format!(
            r#"
            UPDATE vaults
            SET post_id = NULL, updated_at = NOW()
            WHERE id = $1 AND post_id = $2
            RETURNING {VAULT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vault)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vaults WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<VaultWithPost>> {
        let vaults = sqlx::query_as::<_, Vault>(&format!(
            "SELECT {VAULT_COLUMNS} FROM vaults WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let post_ids: Vec<Uuid> = vaults.iter().filter_map(|v| v.post_id).collect();
        let posts: HashMap<Uuid, Post> = if post_ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query_as::<_, Post>(&format!(
                "SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1)"
            ))
            .bind(&post_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
        };

        Ok(vaults
            .into_iter()
            .map(|vault| {
                let post = vault.post_id.and_then(|id| posts.get(&id).cloned());
                VaultWithPost { vault, post }
            })
            .collect())
    }
}
