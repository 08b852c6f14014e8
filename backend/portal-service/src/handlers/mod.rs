/// HTTP handlers for portal-service
///
/// Identifiers travel as query parameters (`postId`, `commentId`, `vaultId`,
/// `publicID`); bodies are JSON except the multipart post upload. Every
/// handler builds its service per request from the shared [`AppState`].
pub mod comments;
pub mod likes;
pub mod posts;
pub mod users;
pub mod vaults;
pub mod webhook;

use crate::error::{AppError, Result};
use crate::models::Page;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

/// Query parameters shared by the interaction endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionQuery {
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub vault_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl InteractionQuery {
    pub fn post_id(&self) -> Result<Uuid> {
        required_id(self.post_id.as_deref(), "post ID")
    }

    pub fn comment_id(&self) -> Result<Uuid> {
        required_id(self.comment_id.as_deref(), "comment ID")
    }

    pub fn vault_id(&self) -> Result<Uuid> {
        required_id(self.vault_id.as_deref(), "vault ID")
    }

    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

/// Parse a required id parameter; missing and malformed ids are both 400
pub fn required_id(value: Option<&str>, what: &str) -> Result<Uuid> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("Please provide the {}!", what)))?;

    Uuid::parse_str(value).map_err(|_| AppError::InvalidInput(format!("Invalid {}", what)))
}

/// Register every portal route under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _| {
        AppError::InvalidInput(err.to_string()).into()
    }))
    .app_data(web::JsonConfig::default().error_handler(|err, _| {
        AppError::InvalidInput(err.to_string()).into()
    }))
    .service(
        web::scope("/api")
            .route("/likes/post-like", web::post().to(likes::toggle_post_like))
            .route("/likes/post-like", web::get().to(likes::list_liked_posts))
            .route("/likes/comment-like", web::post().to(likes::toggle_comment_like))
            .route("/comments", web::get().to(comments::list_comments))
            .route("/comments", web::post().to(comments::create_comment))
            .route("/comments/edit", web::put().to(comments::edit_comment))
            .route("/comments/edit", web::delete().to(comments::delete_comment))
            .route("/vault/all-vaults", web::get().to(vaults::list_vaults))
            .route("/vault/edit", web::put().to(vaults::add_post_to_vault))
            .route("/vault/edit", web::delete().to(vaults::remove_post_from_vault))
            .route("/vault", web::post().to(vaults::create_vault))
            .route("/vault", web::get().to(vaults::get_vault))
            .route("/vault", web::put().to(vaults::update_vault))
            .route("/vault", web::delete().to(vaults::delete_vault))
            .route("/post", web::post().to(posts::upload_post))
            .route("/post", web::get().to(posts::get_post))
            .route("/post", web::delete().to(posts::delete_post))
            .route("/post/status", web::put().to(posts::set_post_status))
            .route("/getPostsByCategory", web::get().to(posts::posts_by_category))
            .route("/user/count", web::get().to(users::user_count))
            .route("/webhook/register", web::post().to(webhook::register_user)),
    );
}

/// Liveness plus a store ping when a database pool is attached
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    if let Some(pool) = &state.pool {
        if let Err(err) = ping(pool).await {
            tracing::warn!(error = %err, "health check database ping failed");
            return HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "database": "unreachable",
            }));
        }
    }

    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn ping(pool: &sqlx::PgPool) -> std::result::Result<(), sqlx::Error> {
    let mut conn = db_pool::acquire_with_metrics(pool, crate::SERVICE_NAME).await?;
    sqlx::query("SELECT 1").execute(&mut *conn).await?;
    Ok(())
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "alive" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_id() {
        let id = Uuid::new_v4();
        assert_eq!(required_id(Some(&id.to_string()), "post ID").unwrap(), id);

        assert!(matches!(
            required_id(None, "post ID"),
            Err(AppError::InvalidInput(ref msg)) if msg == "Please provide the post ID!"
        ));
        assert!(matches!(
            required_id(Some("  "), "vault ID"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            required_id(Some("not-a-uuid"), "vault ID"),
            Err(AppError::InvalidInput(ref msg)) if msg == "Invalid vault ID"
        ));
    }
}
