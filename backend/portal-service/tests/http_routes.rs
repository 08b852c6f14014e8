//! HTTP-level tests for the portal routes
//!
//! Requests go through the session middleware, extractors and handlers
//! against the in-memory store.

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use chrono::Utc;
use common::{bearer, TestContext, WEBHOOK_SECRET};
use crypto_core::WebhookVerifier;
use portal_service::models::{LikeTarget, PostStatus};
use serde_json::{json, Value};
use uuid::Uuid;

#[actix_web::test]
async fn test_like_toggle_round_trip() {
    let ctx = TestContext::new();
    let author = ctx.user("user_a").await;
    let reader = ctx.user("user_b").await;
    let post = ctx.post(&author, "Mehrangarh").await;
    let app = portal_app!(ctx);
    let uri = format!("/api/likes/post-like?postId={}", post.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&ctx.token("user_b")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Liked successfully! 👍");
    assert_eq!(body["liked"], true);
    assert_eq!(body["likePost"]["postId"], post.id.to_string());
    assert_eq!(body["likePost"]["userId"], reader.id.to_string());

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&ctx.token("user_b")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["liked"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("now it's Disliked"));

    assert!(ctx
        .store
        .likes
        .find(reader.id, LikeTarget::Post(post.id))
        .await
        .unwrap()
        .is_none());
}

#[actix_web::test]
async fn test_like_requires_session_and_known_user() {
    let ctx = TestContext::new();
    let author = ctx.user("user_a").await;
    let post = ctx.post(&author, "Mehrangarh").await;
    let app = portal_app!(ctx);
    let uri = format!("/api/likes/post-like?postId={}", post.id);

    let req = test::TestRequest::post().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Valid session, but the webhook never created the local user
    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&ctx.token("user_ghost")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "User not found!");
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_invalid_token_rejected() {
    let ctx = TestContext::new();
    let app = portal_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/vault/all-vaults")
        .insert_header(bearer("not.a.token"))
        .to_request();
    let err = test::try_call_service(&app, req)
        .await
        .err()
        .expect("middleware rejects the token");
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_like_bad_ids() {
    let ctx = TestContext::new();
    ctx.user("user_b").await;
    let app = portal_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/likes/post-like")
        .insert_header(bearer(&ctx.token("user_b")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/api/likes/comment-like?commentId={}", Uuid::new_v4()))
        .insert_header(bearer(&ctx.token("user_b")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_liked_posts_listing() {
    let ctx = TestContext::new();
    let author = ctx.user("user_a").await;
    ctx.user("user_b").await;
    let post = ctx.post(&author, "Mehrangarh").await;
    let app = portal_app!(ctx);

    let list = || {
        test::TestRequest::get()
            .uri("/api/likes/post-like?page=1&limit=5")
            .insert_header(bearer(&ctx.token("user_b")))
            .to_request()
    };

    let resp = test::call_service(&app, list()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/likes/post-like?postId={}", post.id))
        .insert_header(bearer(&ctx.token("user_b")))
        .to_request();
    test::call_service(&app, req).await;

    let resp = test::call_service(&app, list()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["LikedPosts"].as_array().unwrap().len(), 1);
    assert_eq!(body["LikedPosts"][0]["post"]["title"], "Mehrangarh");
}

#[actix_web::test]
async fn test_comment_edit_by_other_user_forbidden() {
    let ctx = TestContext::new();
    let a = ctx.user("user_a").await;
    ctx.user("user_b").await;
    let post = ctx.post(&a, "Clock Tower").await;
    let app = portal_app!(ctx);

    let req = test::TestRequest::post()
        .uri(&format!("/api/comments?postId={}", post.id))
        .insert_header(bearer(&ctx.token("user_a")))
        .set_json(json!({ "text": "Best lassi in town" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let comment_id = body["comment"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/comments/edit?commentId={}", comment_id))
        .insert_header(bearer(&ctx.token("user_b")))
        .set_json(json!({ "newText": "changed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/comments?postId={}", post.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["comments"][0]["text"], "Best lassi in town");
    assert_eq!(body["comments"][0]["ownerUsername"], "user_a");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/comments/edit?commentId={}", comment_id))
        .insert_header(bearer(&ctx.token("user_a")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
}

#[actix_web::test]
async fn test_comment_create_validation() {
    let ctx = TestContext::new();
    let a = ctx.user("user_a").await;
    let post = ctx.post(&a, "Clock Tower").await;
    let app = portal_app!(ctx);

    let req = test::TestRequest::post()
        .uri(&format!("/api/comments?postId={}", post.id))
        .insert_header(bearer(&ctx.token("user_a")))
        .set_json(json!({ "text": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/comments?postId=abc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/api/comments?postId={}&page=x", post.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_comment_listing_far_past_last_page() {
    let ctx = TestContext::new();
    let a = ctx.user("user_a").await;
    let post = ctx.post(&a, "Clock Tower").await;
    let app = portal_app!(ctx);

    let req = test::TestRequest::post()
        .uri(&format!("/api/comments?postId={}", post.id))
        .insert_header(bearer(&ctx.token("user_a")))
        .set_json(json!({ "text": "Spice market at dusk" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/comments?postId={}&page={}&limit=100",
            post.id,
            i64::MAX
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["comments"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_vault_flow() {
    let ctx = TestContext::new();
    let a = ctx.user("user_a").await;
    ctx.user("user_b").await;
    let p1 = ctx.post(&a, "Kaylana Lake").await;
    let app = portal_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/vault")
        .insert_header(bearer(&ctx.token("user_a")))
        .set_json(json!({ "name": "Lakes", "description": "Sunsets" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/api/vault?postId={}", p1.id))
        .insert_header(bearer(&ctx.token("user_a")))
        .set_json(json!({ "name": "Lakes", "description": "Sunsets" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let vault_id = body["newVault"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["newVault"]["postId"], p1.id.to_string());

    // Re-setting the post already in the slot is a no-op
    let req = test::TestRequest::put()
        .uri(&format!("/api/vault/edit?postId={}&vaultId={}", p1.id, vault_id))
        .insert_header(bearer(&ctx.token("user_a")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["vault"]["postId"], p1.id.to_string());

    // Non-owner delete is refused and the vault survives
    let req = test::TestRequest::delete()
        .uri(&format!("/api/vault?vaultId={}", vault_id))
        .insert_header(bearer(&ctx.token("user_b")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/vault?vaultId={}", vault_id))
        .insert_header(bearer(&ctx.token("user_a")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["vault"]["id"], vault_id);
    assert_eq!(body["vault"]["post"]["id"], p1.id.to_string());
    assert_eq!(body["vault"]["post"]["title"], "Kaylana Lake");

    let req = test::TestRequest::put()
        .uri(&format!("/api/vault?vaultId={}", vault_id))
        .insert_header(bearer(&ctx.token("user_a")))
        .set_json(json!({ "name": "Lakes and stepwells", "description": "Water" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["updatedVault"]["name"], "Lakes and stepwells");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/vault/edit?postId={}&vaultId={}", p1.id, vault_id))
        .insert_header(bearer(&ctx.token("user_a")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert!(body["vault"]["postId"].is_null());

    let req = test::TestRequest::get()
        .uri("/api/vault/all-vaults")
        .insert_header(bearer(&ctx.token("user_a")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["vaults"].as_array().unwrap().len(), 1);
    assert!(body["vaults"][0]["post"].is_null());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/vault?vaultId={}", vault_id))
        .insert_header(bearer(&ctx.token("user_a")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"fort.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n",
                boundary
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

#[actix_web::test]
async fn test_post_upload_and_delete() {
    let ctx = TestContext::new();
    ctx.user("user_admin").await;
    ctx.user("user_b").await;
    let app = portal_app!(ctx);
    let boundary = "portalboundary";
    let content_type = format!("multipart/form-data; boundary={}", boundary);
    let fields = [
        ("title", "Mehrangarh"),
        ("content", "Fort above the blue city"),
        ("category", "Landmarks"),
    ];

    let req = test::TestRequest::post()
        .uri("/api/post")
        .insert_header(bearer(&ctx.token("user_b")))
        .insert_header(("Content-Type", content_type.clone()))
        .set_payload(multipart_body(boundary, &fields, Some(b"\xFF\xD8\xFF")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/post")
        .insert_header(bearer(&ctx.admin_token("user_admin")))
        .insert_header(("Content-Type", content_type.clone()))
        .set_payload(multipart_body(boundary, &fields[..2], Some(b"\xFF\xD8\xFF")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Missing required fields");

    let req = test::TestRequest::post()
        .uri("/api/post")
        .insert_header(bearer(&ctx.admin_token("user_admin")))
        .insert_header(("Content-Type", content_type))
        .set_payload(multipart_body(boundary, &fields, Some(b"\xFF\xD8\xFF")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Content is Uploaded, successfully!");
    assert_eq!(ctx.media.asset_count().await, 1);

    let req = test::TestRequest::get()
        .uri("/api/getPostsByCategory?category=Landmarks")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["status"], "approved");
    assert_eq!(posts[0]["creatorUsername"], "user_admin");
    let public_id = posts[0]["publicId"].as_str().unwrap().to_string();
    let post_id = posts[0]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/post/status?postId={}&status=rejected", post_id))
        .insert_header(bearer(&ctx.admin_token("user_admin")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["post"]["status"], "rejected");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/post?publicID={}", public_id))
        .insert_header(bearer(&ctx.admin_token("user_admin")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.media.asset_count().await, 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/post?postId={}", post_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_posts_by_category_errors() {
    let ctx = TestContext::new();
    let app = portal_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/getPostsByCategory")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Category not found!");

    let req = test::TestRequest::get()
        .uri("/api/getPostsByCategory?category=Forts")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

fn webhook_request(verifier: &WebhookVerifier, payload: &Value) -> test::TestRequest {
    let body = serde_json::to_vec(payload).unwrap();
    let timestamp = Utc::now().timestamp();
    let signature = verifier.sign("msg_2abc", timestamp, &body).unwrap();

    test::TestRequest::post()
        .uri("/api/webhook/register")
        .insert_header(("svix-id", "msg_2abc"))
        .insert_header(("svix-timestamp", timestamp.to_string()))
        .insert_header(("svix-signature", signature))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
}

#[actix_web::test]
async fn test_webhook_registers_user() {
    let ctx = TestContext::new();
    let app = portal_app!(ctx);
    let verifier = WebhookVerifier::new(WEBHOOK_SECRET).unwrap();
    let payload = json!({
        "type": "user.created",
        "data": {
            "id": "user_2meera",
            "email_addresses": [{"id": "idn_1", "email_address": "meera@example.com"}],
            "primary_email_address_id": "idn_1",
            "username": null,
            "first_name": "Meera",
            "last_name": "Rathore"
        }
    });

    let resp = test::call_service(&app, webhook_request(&verifier, &payload).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let user = ctx
        .store
        .users
        .find_by_external_id("user_2meera")
        .await
        .unwrap()
        .expect("user created");
    assert_eq!(user.username, "Meera_Rathore");
    assert_eq!(user.email, "meera@example.com");

    // Redelivery is harmless
    let resp = test::call_service(&app, webhook_request(&verifier, &payload).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/user/count").to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 1);
}

#[actix_web::test]
async fn test_webhook_rejects_bad_requests() {
    let ctx = TestContext::new();
    let app = portal_app!(ctx);
    let payload = json!({
        "type": "user.created",
        "data": {
            "id": "user_2meera",
            "email_addresses": [{"id": "idn_1", "email_address": "meera@example.com"}],
            "primary_email_address_id": "idn_1"
        }
    });

    let req = test::TestRequest::post()
        .uri("/api/webhook/register")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let other_secret = WebhookVerifier::new("whsec_c29tZS1vdGhlci1zZWNyZXQ=").unwrap();
    let resp = test::call_service(&app, webhook_request(&other_secret, &payload).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let verifier = WebhookVerifier::new(WEBHOOK_SECRET).unwrap();
    let no_primary = json!({
        "type": "user.created",
        "data": {
            "id": "user_2meera",
            "email_addresses": [],
            "primary_email_address_id": "idn_1"
        }
    });
    let resp = test::call_service(&app, webhook_request(&verifier, &no_primary).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No Primary Email is found!");

    assert_eq!(ctx.store.users.count().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_webhook_duplicate_email_is_client_error() {
    let ctx = TestContext::new();
    let app = portal_app!(ctx);
    let verifier = WebhookVerifier::new(WEBHOOK_SECRET).unwrap();
    let account = |id: &str| {
        json!({
            "type": "user.created",
            "data": {
                "id": id,
                "email_addresses": [{"id": "idn_1", "email_address": "meera@example.com"}],
                "primary_email_address_id": "idn_1",
                "first_name": "Meera"
            }
        })
    };

    let resp =
        test::call_service(&app, webhook_request(&verifier, &account("user_2first")).to_request())
            .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp =
        test::call_service(&app, webhook_request(&verifier, &account("user_2second")).to_request())
            .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(!body["error"].as_str().unwrap().contains("duplicate key"));
    assert_eq!(ctx.store.users.count().await.unwrap(), 1);
}

#[actix_web::test]
async fn test_post_status_requires_admin() {
    let ctx = TestContext::new();
    let a = ctx.user("user_a").await;
    let post = ctx.post(&a, "Jaswant Thada").await;
    let app = portal_app!(ctx);

    let req = test::TestRequest::put()
        .uri(&format!("/api/post/status?postId={}&status=rejected", post.id))
        .insert_header(bearer(&ctx.token("user_a")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let stored = ctx.store.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Approved);
}
