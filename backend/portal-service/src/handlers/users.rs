use crate::error::Result;
use crate::services::UserService;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Number of registered users
pub async fn user_count(state: web::Data<AppState>) -> Result<HttpResponse> {
    let count = UserService::new(state.store.clone()).count().await?;
    Ok(HttpResponse::Ok().json(json!({ "count": count })))
}
