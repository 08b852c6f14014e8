//! Service-level scenarios spanning several aggregates

mod common;

use common::TestContext;
use futures::future::join_all;
use portal_service::models::{Actor, LikeTarget, Page, Role};
use portal_service::services::{CommentService, LikeService, PostService, VaultService};
use std::sync::Arc;

#[actix_rt::test]
async fn test_post_delete_cascades_to_interactions() {
    let ctx = TestContext::new();
    let admin_user = ctx.user("user_admin").await;
    let reader = ctx.user("user_b").await;
    let post = ctx.post(&admin_user, "Toorji Stepwell").await;
    let reader_actor = TestContext::actor(&reader);
    let admin = Actor {
        user_id: admin_user.id,
        role: Role::Admin,
    };

    let vaults = VaultService::new(ctx.store.clone());
    let vault = vaults
        .create(&reader_actor, "Stepwells", "Cool water", Some(post.id))
        .await
        .unwrap();

    let comment = CommentService::new(ctx.store.clone())
        .create(&reader_actor, post.id, "Go early in the morning")
        .await
        .unwrap();

    let likes = LikeService::new(ctx.store.clone());
    likes
        .toggle(&reader_actor, LikeTarget::Post(post.id))
        .await
        .unwrap();
    likes
        .toggle(&reader_actor, LikeTarget::Comment(comment.id))
        .await
        .unwrap();

    PostService::new(ctx.store.clone(), Arc::new(ctx.media.clone()))
        .delete(&admin, &post.public_id)
        .await
        .unwrap();

    let vault = vaults.get(vault.id).await.unwrap();
    assert_eq!(vault.vault.post_id, None);
    assert!(vault.post.is_none());
    assert!(ctx
        .store
        .comments
        .find_by_id(comment.id)
        .await
        .unwrap()
        .is_none());
    assert!(ctx
        .store
        .likes
        .find(reader.id, LikeTarget::Post(post.id))
        .await
        .unwrap()
        .is_none());
    assert!(ctx
        .store
        .likes
        .find(reader.id, LikeTarget::Comment(comment.id))
        .await
        .unwrap()
        .is_none());
    assert!(likes
        .liked_posts(&reader_actor, Page::new(None, None))
        .await
        .is_err());
}

#[actix_rt::test]
async fn test_concurrent_toggles_leave_at_most_one_like() {
    let ctx = TestContext::new();
    let author = ctx.user("user_a").await;
    let reader = ctx.user("user_b").await;
    let post = ctx.post(&author, "Umaid Bhawan").await;
    let actor = TestContext::actor(&reader);
    let likes = LikeService::new(ctx.store.clone());

    let results = join_all(
        (0..8).map(|_| likes.toggle(&actor, LikeTarget::Post(post.id))),
    )
    .await;
    assert!(results.iter().all(|r| r.is_ok()));

    let liked = ctx
        .store
        .likes
        .find(reader.id, LikeTarget::Post(post.id))
        .await
        .unwrap();
    let listed = likes
        .liked_posts(&actor, Page::new(None, None))
        .await
        .map(|posts| posts.len())
        .unwrap_or(0);
    assert_eq!(listed, usize::from(liked.is_some()));
    assert!(listed <= 1);
}

#[actix_rt::test]
async fn test_vault_slot_checks_post_creator() {
    let ctx = TestContext::new();
    let a = ctx.user("user_a").await;
    let b = ctx.user("user_b").await;
    let post_a = ctx.post(&a, "Ghanta Ghar").await;
    let post_b = ctx.post(&b, "Sardar Market").await;
    let actor_a = TestContext::actor(&a);
    let actor_b = TestContext::actor(&b);
    let vaults = VaultService::new(ctx.store.clone());

    let vault = vaults
        .create(&actor_a, "Markets", "Bazaar walk", Some(post_a.id))
        .await
        .unwrap();

    // Slot changes are checked against the post creator
    assert!(vaults.set_post(&actor_b, vault.id, post_a.id).await.is_err());
    assert!(vaults.delete(&actor_b, vault.id).await.is_err());

    let listed = vaults.list(&actor_a).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].vault.post_id, Some(post_a.id));

    let replaced = vaults.set_post(&actor_b, vault.id, post_b.id).await.unwrap();
    assert_eq!(replaced.post_id, Some(post_b.id));
    assert_eq!(replaced.user_id, a.id);
    assert!(vaults.list(&actor_b).await.unwrap().is_empty());
}
