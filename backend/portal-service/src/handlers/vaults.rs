/// Vault handlers
use super::InteractionQuery;
use crate::error::Result;
use crate::models::Actor;
use crate::services::VaultService;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

/// Body for create and update
#[derive(Debug, Default, Deserialize)]
pub struct VaultDetailsRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn service(state: &AppState) -> VaultService {
    VaultService::with_policy(state.store.clone(), state.vault_policy)
}

pub async fn create_vault(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
    req: web::Json<VaultDetailsRequest>,
) -> Result<HttpResponse> {
    // absent postId is reported by the service after the body checks
    let post_id = query
        .post_id
        .as_deref()
        .map(|raw| super::required_id(Some(raw), "post ID"))
        .transpose()?;

    let vault = service(&state)
        .create(&actor, &req.name, &req.description, post_id)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Vault created successfully! 👍",
        "newVault": vault,
    })))
}

pub async fn get_vault(
    state: web::Data<AppState>,
    _actor: Actor,
    query: web::Query<InteractionQuery>,
) -> Result<HttpResponse> {
    let vault_id = query.vault_id()?;
    let vault = service(&state).get(vault_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Vault fetched successfully! 👍",
        "vault": vault,
    })))
}

pub async fn update_vault(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
    req: web::Json<VaultDetailsRequest>,
) -> Result<HttpResponse> {
    let vault_id = query.vault_id()?;
    let vault = service(&state)
        .update(&actor, vault_id, &req.name, &req.description)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Vault updated successfully! 👍",
        "updatedVault": vault,
    })))
}

pub async fn delete_vault(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
) -> Result<HttpResponse> {
    let vault_id = query.vault_id()?;
    service(&state).delete(&actor, vault_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Vault deleted successfully!",
        "success": true,
    })))
}

pub async fn add_post_to_vault(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
) -> Result<HttpResponse> {
    let post_id = query.post_id()?;
    let vault_id = query.vault_id()?;
    let vault = service(&state).set_post(&actor, vault_id, post_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Post added to the vault successfully!",
        "vault": vault,
    })))
}

pub async fn remove_post_from_vault(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
) -> Result<HttpResponse> {
    let post_id = query.post_id()?;
    let vault_id = query.vault_id()?;
    let vault = service(&state).clear_post(&actor, vault_id, post_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Post removed from the vault successfully!",
        "vault": vault,
    })))
}

/// The caller's vaults with their attached post
pub async fn list_vaults(state: web::Data<AppState>, actor: Actor) -> Result<HttpResponse> {
    let vaults = service(&state).list(&actor).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Vaults fetched successfully! 👍",
        "vaults": vaults,
    })))
}
