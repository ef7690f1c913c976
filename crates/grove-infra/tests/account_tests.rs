//! Sign-in and image uploads.

mod common;

use grove_core::DomainError;
use grove_core::domain::Role;
use grove_core::ports::{ImageUpload, MAX_IMAGE_BYTES};
use grove_core::services::SignInProfile;

use crate::common::TestHarness;

fn profile(email: &str) -> SignInProfile {
    SignInProfile {
        email: email.to_string(),
        name: "Robin Wood".to_string(),
        image: Some("https://avatars.example.com/robin.png".to_string()),
    }
}

#[tokio::test]
async fn first_sign_in_creates_user() {
    let h = TestHarness::new();

    let user = h.accounts.sign_in(profile("  Robin@Example.COM ")).await.unwrap();

    assert_eq!(user.email, "robin@example.com");
    assert_eq!(user.role, Role::User);
    assert_eq!(user.posts_count, 0);
}

#[tokio::test]
async fn returning_sign_in_reuses_account() {
    let h = TestHarness::new();
    let first = h.accounts.sign_in(profile("robin@example.com")).await.unwrap();

    let second = h.accounts.sign_in(profile("ROBIN@example.com")).await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(second.last_login >= first.last_login);
}

#[tokio::test]
async fn sign_in_validates_profile() {
    let h = TestHarness::new();

    let result = h
        .accounts
        .sign_in(SignInProfile {
            email: "not-an-email".to_string(),
            name: " ".to_string(),
            image: None,
        })
        .await;

    match result {
        Err(DomainError::Validation(fields)) => assert_eq!(fields.len(), 2),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn profile_returns_stored_user() {
    let h = TestHarness::new();
    let actor = h.user("me@example.com").await;

    let user = h.accounts.profile(Some(&actor)).await.unwrap();

    assert_eq!(user.id, actor.user_id);
    assert!(matches!(
        h.accounts.profile(None).await,
        Err(DomainError::Unauthenticated)
    ));
}

#[tokio::test]
async fn upload_stores_image() {
    let h = TestHarness::new();
    let actor = h.user("me@example.com").await;

    let stored = h
        .uploads
        .upload(
            Some(&actor),
            ImageUpload {
                content_type: "image/png".to_string(),
                bytes: vec![0x89, b'P', b'N', b'G'],
            },
        )
        .await
        .unwrap();

    assert!(stored.url.ends_with(&stored.delete_id));
    assert!(h.media.contains(&stored.delete_id).await);
}

#[tokio::test]
async fn upload_rejects_non_images_and_oversized_files() {
    let h = TestHarness::new();
    let actor = h.user("me@example.com").await;

    let pdf = h
        .uploads
        .upload(
            Some(&actor),
            ImageUpload {
                content_type: "application/pdf".to_string(),
                bytes: vec![1, 2, 3],
            },
        )
        .await;
    let huge = h
        .uploads
        .upload(
            Some(&actor),
            ImageUpload {
                content_type: "image/jpeg".to_string(),
                bytes: vec![0; MAX_IMAGE_BYTES + 1],
            },
        )
        .await;

    assert!(matches!(pdf, Err(DomainError::Validation(_))));
    assert!(matches!(huge, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn upload_requires_caller() {
    let h = TestHarness::new();

    let result = h
        .uploads
        .upload(
            None,
            ImageUpload {
                content_type: "image/png".to_string(),
                bytes: vec![1],
            },
        )
        .await;

    assert!(matches!(result, Err(DomainError::Unauthenticated)));
}
