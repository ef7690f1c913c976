//! Approve, reject and delete.

mod common;

use grove_core::DomainError;
use grove_core::domain::{Actor, PostStatus, Role};
use grove_core::ports::{HeartRepository, NotificationKind};
use grove_core::services::NewPost;

use crate::common::{TestHarness, new_post};

#[tokio::test]
async fn approve_publishes_and_credits_author() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("author@example.com").await;
    let post = h.submit(&author, "Ready for review").await;

    let approved = h.moderation.approve(Some(&admin), post.id).await.unwrap();

    assert_eq!(approved.status(), PostStatus::Published);
    assert!(approved.moderation.published_at().is_some());
    assert_eq!(h.stored_user(&author).await.posts_count, 1);

    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, "author@example.com");
    assert_eq!(
        sent[0].kind,
        NotificationKind::PostApproved {
            title: "Ready for review".to_string(),
            slug: "ready-for-review".to_string(),
        }
    );
}

#[tokio::test]
async fn second_approval_is_an_invalid_transition() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("author@example.com").await;
    let post = h.published(&author, &admin, "Approved once").await;

    let again = h.moderation.approve(Some(&admin), post.id).await;

    assert!(matches!(
        again,
        Err(DomainError::InvalidTransition {
            from: PostStatus::Published,
            to: PostStatus::Published,
        })
    ));
    assert_eq!(h.stored_user(&author).await.posts_count, 1);
    assert_eq!(h.notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn rejected_post_cannot_be_approved() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("author@example.com").await;
    let post = h.submit(&author, "Off topic").await;
    h.moderation
        .reject(Some(&admin), post.id, "Off topic")
        .await
        .unwrap();

    let result = h.moderation.approve(Some(&admin), post.id).await;

    assert!(matches!(
        result,
        Err(DomainError::InvalidTransition {
            from: PostStatus::Rejected,
            ..
        })
    ));
    assert_eq!(h.stored_user(&author).await.posts_count, 0);
}

#[tokio::test]
async fn moderation_requires_admin() {
    let h = TestHarness::new();
    let author = h.user("author@example.com").await;
    let post = h.submit(&author, "Self approval").await;

    assert!(matches!(
        h.moderation.approve(Some(&author), post.id).await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        h.moderation.approve(None, post.id).await,
        Err(DomainError::Unauthenticated)
    ));
    assert!(matches!(
        h.moderation.delete(Some(&author), post.id).await,
        Err(DomainError::Forbidden)
    ));
    assert_eq!(
        h.stored_post(post.id).await.map(|p| p.status()),
        Some(PostStatus::Pending)
    );
}

#[tokio::test]
async fn admin_checks_use_the_stored_role() {
    let h = TestHarness::new();
    let author = h.user("author@example.com").await;
    let post = h.submit(&author, "Stale session").await;

    // Session still says admin, account was demoted.
    let demoted = h.user("former-admin@example.com").await;
    let stale_admin = Actor::new(demoted.user_id, Role::Admin);
    assert!(matches!(
        h.moderation.approve(Some(&stale_admin), post.id).await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        h.moderation.delete(Some(&stale_admin), post.id).await,
        Err(DomainError::Forbidden)
    ));
    assert!(matches!(
        h.posts.moderation_queue(Some(&stale_admin)).await,
        Err(DomainError::Forbidden)
    ));

    // Session still says user, account was promoted.
    let promoted = h.admin().await;
    let stale_user = Actor::new(promoted.user_id, Role::User);
    let approved = h
        .moderation
        .approve(Some(&stale_user), post.id)
        .await
        .unwrap();
    assert_eq!(approved.status(), PostStatus::Published);
}

#[tokio::test]
async fn approving_missing_post_is_not_found() {
    let h = TestHarness::new();
    let admin = h.admin().await;

    let result = h.moderation.approve(Some(&admin), uuid::Uuid::new_v4()).await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn reject_records_reason_and_notifies() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("author@example.com").await;
    let post = h.submit(&author, "Needs work").await;

    let rejected = h
        .moderation
        .reject(Some(&admin), post.id, "  Please add sources  ")
        .await
        .unwrap();

    assert_eq!(rejected.status(), PostStatus::Rejected);
    assert_eq!(
        rejected.moderation.rejection_reason(),
        Some("Please add sources")
    );
    let sent = h.notifier.sent().await;
    assert!(matches!(
        &sent[0].kind,
        NotificationKind::PostRejected { reason, .. } if reason == "Please add sources"
    ));
}

#[tokio::test]
async fn reject_with_empty_reason_leaves_post_pending() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("author@example.com").await;
    let post = h.submit(&author, "Pending forever").await;

    let result = h.moderation.reject(Some(&admin), post.id, "   ").await;

    match result {
        Err(DomainError::Validation(fields)) => assert_eq!(fields[0].field, "reason"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(
        h.stored_post(post.id).await.map(|p| p.status()),
        Some(PostStatus::Pending)
    );
    assert!(h.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn reject_with_overlong_reason_fails() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("author@example.com").await;
    let post = h.submit(&author, "Long reason").await;

    let result = h
        .moderation
        .reject(Some(&admin), post.id, &"x".repeat(501))
        .await;

    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn notification_failure_does_not_fail_approval() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("author@example.com").await;
    let post = h.submit(&author, "Quiet approval").await;
    h.notifier.set_failing(true);

    let approved = h.moderation.approve(Some(&admin), post.id).await.unwrap();

    assert_eq!(approved.status(), PostStatus::Published);
    assert_eq!(h.stored_user(&author).await.posts_count, 1);
}

#[tokio::test]
async fn delete_removes_post_hearts_and_cover() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("author@example.com").await;
    let (post, cover) = h.submit_with_cover(&author, "Well loved").await;
    h.moderation.approve(Some(&admin), post.id).await.unwrap();

    for i in 0..3 {
        let fan = h.user(&format!("fan{i}@example.com")).await;
        h.engagement.toggle_heart(Some(&fan), post.id).await.unwrap();
    }
    assert_eq!(h.store.hearts().count_for_post(post.id).await.unwrap(), 3);

    h.moderation.delete(Some(&admin), post.id).await.unwrap();

    assert_eq!(h.store.hearts().count_for_post(post.id).await.unwrap(), 0);
    assert!(h.stored_post(post.id).await.is_none());
    assert_eq!(h.media.deleted().await, vec![cover.delete_id.clone()]);
    assert!(!h.media.contains(&cover.delete_id).await);

    let fan = h.user("latecomer@example.com").await;
    let toggle = h.engagement.toggle_heart(Some(&fan), post.id).await;
    assert!(matches!(toggle, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn delete_survives_media_failure() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("author@example.com").await;
    let (post, _) = h.submit_with_cover(&author, "Media trouble").await;
    h.media.set_failing(true);

    h.moderation.delete(Some(&admin), post.id).await.unwrap();

    assert!(h.stored_post(post.id).await.is_none());
}

#[tokio::test]
async fn delete_never_reaches_another_users_image() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let victim = h.user("victim@example.com").await;
    let author = h.user("author@example.com").await;
    let (_, victim_cover) = h.submit_with_cover(&victim, "Victim cover").await;

    let foreign_handle = h
        .posts
        .submit(
            Some(&author),
            NewPost {
                cover_image_url: Some("https://img.example.com/cat.png".to_string()),
                cover_image_id: Some(victim_cover.delete_id.clone()),
                ..new_post("Borrowed handle")
            },
        )
        .await;
    match foreign_handle {
        Err(DomainError::Validation(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "cover_image_id");
        }
        other => panic!("expected a validation error, got {other:?}"),
    }

    let external = h
        .posts
        .submit(
            Some(&author),
            NewPost {
                cover_image_url: Some("https://img.example.com/cat.png".to_string()),
                ..new_post("External cover")
            },
        )
        .await
        .unwrap();
    assert_eq!(external.cover_image.as_ref().and_then(|c| c.delete_id.clone()), None);

    h.moderation.delete(Some(&admin), external.id).await.unwrap();

    assert!(h.media.deleted().await.is_empty());
    assert!(h.media.contains(&victim_cover.delete_id).await);
}

#[tokio::test]
async fn cover_url_alone_gets_a_delete_handle() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("author@example.com").await;
    let image = h.uploaded_image().await;

    let post = h
        .posts
        .submit(
            Some(&author),
            NewPost {
                cover_image_url: Some(image.url.clone()),
                ..new_post("Handle from url")
            },
        )
        .await
        .unwrap();
    assert_eq!(
        post.cover_image.as_ref().and_then(|c| c.delete_id.as_deref()),
        Some(image.delete_id.as_str())
    );

    h.moderation.delete(Some(&admin), post.id).await.unwrap();

    assert_eq!(h.media.deleted().await, vec![image.delete_id.clone()]);
    assert!(!h.media.contains(&image.delete_id).await);
}

#[tokio::test]
async fn delete_of_missing_post_is_not_found() {
    let h = TestHarness::new();
    let admin = h.admin().await;

    let result = h.moderation.delete(Some(&admin), uuid::Uuid::new_v4()).await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}
