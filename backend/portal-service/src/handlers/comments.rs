/// Comment handlers - HTTP endpoints for comment operations
use super::InteractionQuery;
use crate::error::Result;
use crate::models::Actor;
use crate::services::CommentService;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

/// Request body for creating a comment
#[derive(Debug, Default, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub text: String,
}

/// Request body for editing a comment
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCommentRequest {
    #[serde(default)]
    pub new_text: String,
}

/// Get comments for a post
pub async fn list_comments(
    state: web::Data<AppState>,
    query: web::Query<InteractionQuery>,
) -> Result<HttpResponse> {
    let post_id = query.post_id()?;
    let service = CommentService::new(state.store.clone());
    let comments = service.list(post_id, query.page()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Comments fetched successfully!",
        "comments": comments,
    })))
}

/// Create a new comment
pub async fn create_comment(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let post_id = query.post_id()?;
    let service = CommentService::new(state.store.clone());
    let comment = service.create(&actor, post_id, &req.text).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Comment is created Successfully! 👍",
        "success": true,
        "comment": comment,
    })))
}

/// Update a comment's text
pub async fn edit_comment(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
    req: web::Json<EditCommentRequest>,
) -> Result<HttpResponse> {
    let comment_id = query.comment_id()?;
    let service = CommentService::new(state.store.clone());
    let comment = service.edit(&actor, comment_id, &req.new_text).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Comment is updated Successfully! 👍",
        "comment": comment,
    })))
}

/// Delete a comment
pub async fn delete_comment(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
) -> Result<HttpResponse> {
    let comment_id = query.comment_id()?;
    let service = CommentService::new(state.store.clone());
    service.delete(&actor, comment_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Comment is deleted Successfully! 👍",
        "success": true,
    })))
}
