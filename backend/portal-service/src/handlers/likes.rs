/// Like handlers - toggle likes and list liked posts
use super::InteractionQuery;
use crate::error::Result;
use crate::models::{Actor, LikeTarget};
use crate::services::{LikeService, LikeToggle};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Like a post, or remove the like if it already exists
pub async fn toggle_post_like(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
) -> Result<HttpResponse> {
    let post_id = query.post_id()?;
    let service = LikeService::new(state.store.clone());

    let body = match service.toggle(&actor, LikeTarget::Post(post_id)).await? {
        LikeToggle::Liked(like) => json!({
            "message": "Liked successfully! 👍",
            "likePost": like,
            "liked": true,
        }),
        LikeToggle::Unliked => json!({
            "error": "You already liked this post!, now it's Disliked successfully!",
            "liked": false,
        }),
    };

    Ok(HttpResponse::Ok().json(body))
}

/// Like a comment, or remove the like if it already exists
pub async fn toggle_comment_like(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
) -> Result<HttpResponse> {
    let comment_id = query.comment_id()?;
    let service = LikeService::new(state.store.clone());

    let body = match service
        .toggle(&actor, LikeTarget::Comment(comment_id))
        .await?
    {
        LikeToggle::Liked(like) => json!({
            "message": "Liked successfully! 👍",
            "likeComment": like,
            "liked": true,
        }),
        LikeToggle::Unliked => json!({
            "error": "You already liked this Comment!, now it's Disliked successfully!",
            "liked": false,
        }),
    };

    Ok(HttpResponse::Ok().json(body))
}

/// Posts the caller liked, newest like first
pub async fn list_liked_posts(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<InteractionQuery>,
) -> Result<HttpResponse> {
    let service = LikeService::new(state.store.clone());
    let liked = service.liked_posts(&actor, query.page()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Liked posts fetched successfully!",
        "LikedPosts": liked,
    })))
}
