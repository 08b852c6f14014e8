/// Post handlers - admin upload/moderation and public lookups
use super::required_id;
use crate::error::{AppError, Result};
use crate::media::MediaFile;
use crate::middleware::ensure_admin;
use crate::models::{Actor, PostStatus};
use crate::services::{PostService, PostUpload};
use crate::state::AppState;
use actix_multipart::{Field, Multipart};
use actix_web::http::header::{self, ContentDisposition};
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use serde::Deserialize;
use serde_json::json;

/// Limit for the plain text form fields
const TEXT_FIELD_LIMIT: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    #[serde(rename = "postId")]
    pub post_id: Option<String>,
    #[serde(rename = "publicID")]
    pub public_id: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
}

fn service(state: &AppState) -> PostService {
    PostService::new(state.store.clone(), state.media.clone())
}

/// Multipart upload with `file`, `title`, `content` and `category` fields
pub async fn upload_post(
    state: web::Data<AppState>,
    actor: Actor,
    payload: Multipart,
) -> Result<HttpResponse> {
    ensure_admin(&actor)?;

    let upload = read_upload(payload, state.max_upload_bytes).await?;
    service(&state).upload(&actor, upload).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Content is Uploaded, successfully!",
        "success": true,
    })))
}

async fn read_upload(mut payload: Multipart, max_file_bytes: usize) -> Result<PostUpload> {
    let mut upload = PostUpload::default();

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let disposition = field
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| ContentDisposition::from_raw(value).ok());
        let name = disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        match name.as_str() {
            "file" => {
                let filename = disposition
                    .as_ref()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or("upload")
                    .to_string();
                let content_type = match field.content_type() {
                    Some(ct) if ct.type_() != mime::IMAGE => {
                        return Err(AppError::InvalidInput(
                            "Only image uploads are supported".to_string(),
                        ))
                    }
                    ct => ct.map(|ct| ct.to_string()),
                };
                let bytes = read_field(&mut field, max_file_bytes).await?;
                upload.file = Some(MediaFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            "title" | "content" | "category" => {
                let bytes = read_field(&mut field, TEXT_FIELD_LIMIT).await?;
                let value = String::from_utf8(bytes).map_err(|_| {
                    AppError::InvalidInput(format!("Field '{}' must be valid UTF-8", name))
                })?;
                match name.as_str() {
                    "title" => upload.title = Some(value),
                    "content" => upload.content = Some(value),
                    _ => upload.category = Some(value),
                }
            }
            _ => {
                // Drain unknown fields so the stream can advance
                while field.try_next().await.map_err(multipart_error)?.is_some() {}
            }
        }
    }

    Ok(upload)
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::InvalidInput(format!(
                "Upload exceeds the {} byte limit",
                limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn multipart_error(err: actix_multipart::MultipartError) -> AppError {
    AppError::InvalidInput(format!("Invalid multipart payload: {}", err))
}

pub async fn delete_post(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<PostQuery>,
) -> Result<HttpResponse> {
    let public_id = query
        .public_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Please provide the publicID!".to_string()))?;

    service(&state).delete(&actor, public_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Post deleted successfully!",
        "success": true,
    })))
}

pub async fn set_post_status(
    state: web::Data<AppState>,
    actor: Actor,
    query: web::Query<PostQuery>,
) -> Result<HttpResponse> {
    let post_id = required_id(query.post_id.as_deref(), "post ID")?;
    let status: PostStatus = query
        .status
        .as_deref()
        .ok_or_else(|| AppError::InvalidInput("Please provide the status!".to_string()))?
        .parse()
        .map_err(AppError::InvalidInput)?;

    let post = service(&state).set_status(&actor, post_id, status).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Post status updated successfully!",
        "post": post,
    })))
}

pub async fn posts_by_category(
    state: web::Data<AppState>,
    query: web::Query<PostQuery>,
) -> Result<HttpResponse> {
    let posts = service(&state)
        .by_category(query.category.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Posts fetched successfully!",
        "posts": posts,
    })))
}

pub async fn get_post(
    state: web::Data<AppState>,
    query: web::Query<PostQuery>,
) -> Result<HttpResponse> {
    let post_id = required_id(query.post_id.as_deref(), "post ID")?;
    let post = service(&state).get(post_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "post": post })))
}
