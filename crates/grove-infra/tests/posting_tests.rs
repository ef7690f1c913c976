//! Post submission and the public read side.

mod common;

use grove_core::DomainError;
use grove_core::domain::{Actor, PostStatus, Role};
use grove_core::ports::PostRepository;
use grove_core::services::{NewPost, PageRequest};

use crate::common::{TestHarness, new_post, words};

fn is_kebab(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}

#[tokio::test]
async fn submit_creates_pending_post() {
    let h = TestHarness::new();
    let author = h.user("walker@example.com").await;

    let post = h.submit(&author, "My Walk in the Woods").await;

    assert_eq!(post.status(), PostStatus::Pending);
    assert_eq!(post.slug, "my-walk-in-the-woods");
    assert_eq!(post.reading_time, 1);
    assert_eq!(post.hearts, 0);
    assert_eq!(h.stored_user(&author).await.posts_count, 0);
}

#[tokio::test]
async fn submit_requires_caller() {
    let h = TestHarness::new();

    let result = h.posts.submit(None, new_post("Anonymous")).await;

    assert!(matches!(result, Err(DomainError::Unauthenticated)));
}

#[tokio::test]
async fn submit_by_unknown_account_is_not_found() {
    let h = TestHarness::new();
    let ghost = Actor::new(uuid::Uuid::new_v4(), Role::User);

    let result = h.posts.submit(Some(&ghost), new_post("Nobody home")).await;

    assert!(matches!(
        result,
        Err(DomainError::NotFound { entity_type: "user", .. })
    ));
    assert_eq!(h.store.posts().count_by_status(PostStatus::Pending).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_titles_get_numbered_slugs() {
    let h = TestHarness::new();
    let author = h.user("a@example.com").await;

    let first = h.submit(&author, "Hello World").await;
    let second = h.submit(&author, "Hello World").await;
    let third = h.submit(&author, "Hello, World!").await;

    assert_eq!(first.slug, "hello-world");
    assert_eq!(second.slug, "hello-world-1");
    assert_eq!(third.slug, "hello-world-2");
}

#[tokio::test]
async fn slugs_are_kebab_case_and_unique() {
    let h = TestHarness::new();
    let author = h.user("a@example.com").await;

    let mut slugs = Vec::new();
    for title in ["  Spaces  everywhere ", "Ünïcödé title", "***", "***", "C++ & Rust"] {
        slugs.push(h.submit(&author, title).await.slug);
    }

    for slug in &slugs {
        assert!(is_kebab(slug), "{slug} is not kebab-case");
    }
    let mut unique = slugs.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), slugs.len());
    assert_eq!(slugs[2], "post");
    assert_eq!(slugs[3], "post-1");
}

#[tokio::test]
async fn sixth_submission_of_the_day_is_rejected() {
    let h = TestHarness::new();
    let author = h.user("prolific@example.com").await;

    for i in 0..5 {
        h.submit(&author, &format!("Post number {i}")).await;
    }
    let sixth = h.posts.submit(Some(&author), new_post("One too many")).await;

    assert!(matches!(sixth, Err(DomainError::QuotaExceeded { limit: 5 })));
    let dashboard = h.posts.author_dashboard(Some(&author)).await.unwrap();
    assert_eq!(dashboard.posts.len(), 5);
}

#[tokio::test]
async fn quota_is_per_author() {
    let h = TestHarness::new();
    let a = h.user("a@example.com").await;
    let b = h.user("b@example.com").await;

    for i in 0..5 {
        h.submit(&a, &format!("Post number {i}")).await;
    }

    assert!(h.posts.submit(Some(&b), new_post("Fresh author")).await.is_ok());
}

#[tokio::test]
async fn invalid_submission_creates_nothing() {
    let h = TestHarness::new();
    let author = h.user("a@example.com").await;

    let result = h
        .posts
        .submit(
            Some(&author),
            NewPost {
                title: "Hi".to_string(),
                content: words(3),
                ..Default::default()
            },
        )
        .await;

    match result {
        Err(DomainError::Validation(fields)) => assert_eq!(fields.len(), 2),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(h.posts.author_dashboard(Some(&author)).await.unwrap().posts.is_empty());
}

#[tokio::test]
async fn tags_are_trimmed_and_blank_ones_dropped() {
    let h = TestHarness::new();
    let author = h.user("a@example.com").await;

    let post = h
        .posts
        .submit(
            Some(&author),
            NewPost {
                tags: vec![" rust ".to_string(), "   ".to_string(), "web".to_string()],
                ..new_post("Tagged post")
            },
        )
        .await
        .unwrap();

    assert_eq!(post.tags, vec!["rust".to_string(), "web".to_string()]);
}

#[tokio::test]
async fn only_published_posts_are_listed() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("a@example.com").await;

    h.submit(&author, "Still pending").await;
    let published = h.published(&author, &admin, "Now live").await;

    let page = h.posts.list_published(PageRequest::default()).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.pages, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].post.id, published.id);
    assert_eq!(page.items[0].author.as_ref().map(|a| a.name.as_str()), Some("a"));
}

#[tokio::test]
async fn pending_post_is_not_readable_by_slug() {
    let h = TestHarness::new();
    let author = h.user("a@example.com").await;
    let post = h.submit(&author, "Not yet").await;

    let result = h.posts.get_published(&post.slug, None).await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn listing_paginates() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let a = h.user("a@example.com").await;
    let b = h.user("b@example.com").await;

    for i in 0..5 {
        h.published(&a, &admin, &format!("A post {i}")).await;
        h.published(&b, &admin, &format!("B post {i}")).await;
    }

    let page = h
        .posts
        .list_published(PageRequest::new(Some(2), Some(4)))
        .await
        .unwrap();

    assert_eq!(page.total, 10);
    assert_eq!(page.pages, 3);
    assert_eq!(page.items.len(), 4);
    assert_eq!(page.page, 2);
}

#[tokio::test]
async fn moderation_queue_is_admin_only() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("a@example.com").await;
    h.submit(&author, "Waiting for review").await;

    assert!(matches!(
        h.posts.moderation_queue(Some(&author)).await,
        Err(DomainError::Forbidden)
    ));
    assert_eq!(h.posts.moderation_queue(Some(&admin)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sitemap_lists_published_slugs() {
    let h = TestHarness::new();
    let admin = h.admin().await;
    let author = h.user("a@example.com").await;
    h.submit(&author, "Hidden draft").await;
    h.published(&author, &admin, "Visible post").await;

    let entries = h.posts.sitemap_entries().await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].slug, "visible-post");
}
