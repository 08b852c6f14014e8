/// Vault service - named single-post bookmarks
///
/// A vault holds at most one post. Attaching a post replaces whatever the
/// slot held; the permission check for attaching is against the creator of
/// the *post*, not the vault owner.
use crate::config::VaultPolicyConfig;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::{ensure_owner, is_owner};
use crate::models::{Actor, NewVault, Post, Vault, VaultWithPost};
use uuid::Uuid;

pub struct VaultService {
    store: Store,
    policy: VaultPolicyConfig,
}

impl VaultService {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            policy: VaultPolicyConfig::default(),
        }
    }

    pub fn with_policy(store: Store, policy: VaultPolicyConfig) -> Self {
        Self { store, policy }
    }

    /// A vault is always created around an existing post
    pub async fn create(
        &self,
        actor: &Actor,
        name: &str,
        description: &str,
        post_id: Option<Uuid>,
    ) -> Result<Vault> {
        let result: Result<Vault> = async {
            let (name, description) = required_details(name, description)?;
            let post_id = post_id
                .ok_or_else(|| AppError::InvalidInput("Please provide the post ID!".to_string()))?;
            self.find_post(post_id).await?;

            self.store
                .vaults
                .insert(NewVault {
                    name: name.to_string(),
                    description: description.to_string(),
                    user_id: actor.user_id,
                    post_id,
                })
                .await
        }
        .await;

        match &result {
            Ok(vault) => tracing::info!(
                vault_id = %vault.id,
                user_id = %actor.user_id,
                "vault created"
            ),
            Err(err) => metrics::record_error("create_vault", err),
        }
        result
    }

    /// Vault with the post its slot holds
    pub async fn get(&self, vault_id: Uuid) -> Result<VaultWithPost> {
        self.store
            .vaults
            .find_with_post(vault_id)
            .await?
            .ok_or_else(vault_not_found)
    }

    /// Rename and re-describe. Any authenticated user may do this unless the
    /// owner policy is switched on.
    pub async fn update(
        &self,
        actor: &Actor,
        vault_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Vault> {
        let result: Result<Vault> = async {
            let (name, description) = required_details(name, description)?;
            let vault = self.find_vault(vault_id).await?;
            if self.policy.enforce_owner_on_update {
                ensure_owner(actor, vault.user_id, "vault")?;
            }

            self.store
                .vaults
                .update_details(vault_id, name, description)
                .await?
                .ok_or_else(vault_not_found)
        }
        .await;

        if let Err(err) = &result {
            metrics::record_error("update_vault", err);
        }
        result
    }

    pub async fn delete(&self, actor: &Actor, vault_id: Uuid) -> Result<()> {
        let result: Result<()> = async {
            let vault = self.find_vault(vault_id).await?;
            if !is_owner(actor.user_id, vault.user_id) {
                return Err(AppError::Forbidden(
                    "You are not the owner of this vault!".to_string(),
                ));
            }

            if !self.store.vaults.delete(vault_id).await? {
                return Err(vault_not_found());
            }
            tracing::info!(%vault_id, user_id = %actor.user_id, "vault deleted");
            Ok(())
        }
        .await;

        if let Err(err) = &result {
            metrics::record_error("delete_vault", err);
        }
        result
    }

    /// Put `post_id` into the vault's slot, replacing any previous post.
    /// Re-setting the post already held is a no-op.
    pub async fn set_post(&self, actor: &Actor, vault_id: Uuid, post_id: Uuid) -> Result<Vault> {
        let result: Result<Vault> = async {
            let vault = self.find_vault(vault_id).await?;
            let post = self.find_post(post_id).await?;
            if !is_owner(actor.user_id, post.created_by) {
                return Err(AppError::Forbidden(
                    "You are not the owner of this post!".to_string(),
                ));
            }

            if vault.post_id == Some(post_id) {
                tracing::debug!(%vault_id, %post_id, "post is already in the vault");
                return Ok(vault);
            }

            self.store
                .vaults
                .set_post(vault_id, post_id)
                .await?
                .ok_or_else(vault_not_found)
        }
        .await;

        if let Err(err) = &result {
            metrics::record_error("set_vault_post", err);
        }
        result
    }

    /// Empty the slot, but only while it still holds `post_id`
    pub async fn clear_post(&self, actor: &Actor, vault_id: Uuid, post_id: Uuid) -> Result<Vault> {
        let result: Result<Vault> = async {
            self.find_vault(vault_id).await?;
            self.store
                .vaults
                .clear_post(vault_id, post_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Post is not in the vault!".to_string()))
        }
        .await;

        match &result {
            Ok(_) => tracing::info!(
                %vault_id,
                %post_id,
                user_id = %actor.user_id,
                "post removed from vault"
            ),
            Err(err) => metrics::record_error("clear_vault_post", err),
        }
        result
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<VaultWithPost>> {
        self.store.vaults.list_by_owner(actor.user_id).await
    }

    async fn find_vault(&self, vault_id: Uuid) -> Result<Vault> {
        self.store
            .vaults
            .find_by_id(vault_id)
            .await?
            .ok_or_else(vault_not_found)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Post> {
        self.store
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }
}

fn vault_not_found() -> AppError {
    AppError::NotFound("Vault not found!".to_string())
}

fn required_details<'a>(name: &'a str, description: &'a str) -> Result<(&'a str, &'a str)> {
    let (name, description) = (name.trim(), description.trim());
    if name.is_empty() || description.is_empty() {
        return Err(AppError::InvalidInput(
            "Please provide a name and the description of the vault!".to_string(),
        ));
    }
    Ok((name, description))
}
