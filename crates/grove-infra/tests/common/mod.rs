// Shared harness: core services wired to the in-memory adapters.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use grove_core::domain::{Actor, Post, Role, User};
use grove_core::ports::{
    BaseRepository, ImageUpload, MediaStore, Notification, Notifier, NotifyError, StoredImage,
};
use grove_core::services::{
    AccountService, EngagementService, ModerationService, NewPost, PostService, PostingPolicy,
    UploadService,
};
use grove_infra::{InMemoryMediaStore, InMemoryStore};

/// Records notifications instead of delivering them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(NotifyError::QueueFull);
        }
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

pub struct TestHarness {
    pub store: InMemoryStore,
    pub media: Arc<InMemoryMediaStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub posts: PostService,
    pub moderation: ModerationService,
    pub engagement: EngagementService,
    pub accounts: AccountService,
    pub uploads: UploadService,
}

impl TestHarness {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let media = Arc::new(InMemoryMediaStore::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let posts = Arc::new(store.posts());
        let users = Arc::new(store.users());
        let hearts = Arc::new(store.hearts());
        let comments = Arc::new(store.comments());

        Self {
            posts: PostService::new(
                posts.clone(),
                users.clone(),
                hearts.clone(),
                comments.clone(),
                media.clone(),
                PostingPolicy::default(),
            ),
            moderation: ModerationService::new(
                posts.clone(),
                users.clone(),
                hearts.clone(),
                media.clone(),
                notifier.clone(),
            ),
            engagement: EngagementService::new(posts, users.clone(), hearts, comments),
            accounts: AccountService::new(users),
            uploads: UploadService::new(media.clone()),
            store,
            media,
            notifier,
        }
    }

    pub async fn user(&self, email: &str) -> Actor {
        let user = User::new(email, display_name(email), None);
        self.store.users().insert(user).await.unwrap().actor()
    }

    pub async fn admin(&self) -> Actor {
        let mut user = User::new("admin@example.com", "Admin".to_string(), None);
        user.role = Role::Admin;
        self.store.users().insert(user).await.unwrap().actor()
    }

    pub async fn stored_user(&self, actor: &Actor) -> User {
        self.store
            .users()
            .find_by_id(actor.user_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn stored_post(&self, post_id: uuid::Uuid) -> Option<Post> {
        self.store.posts().find_by_id(post_id).await.unwrap()
    }

    pub async fn submit(&self, author: &Actor, title: &str) -> Post {
        self.posts
            .submit(Some(author), new_post(title))
            .await
            .unwrap()
    }

    /// An image held by the harness media store.
    pub async fn uploaded_image(&self) -> StoredImage {
        self.media
            .upload(ImageUpload {
                content_type: "image/png".to_string(),
                bytes: vec![0x89, b'P', b'N', b'G'],
            })
            .await
            .unwrap()
    }

    /// Submit a post whose cover was uploaded through the harness media store.
    pub async fn submit_with_cover(&self, author: &Actor, title: &str) -> (Post, StoredImage) {
        let image = self.uploaded_image().await;
        let post = self
            .posts
            .submit(
                Some(author),
                NewPost {
                    cover_image_url: Some(image.url.clone()),
                    cover_image_id: Some(image.delete_id.clone()),
                    ..new_post(title)
                },
            )
            .await
            .unwrap();
        (post, image)
    }

    /// Submit and approve a post.
    pub async fn published(&self, author: &Actor, admin: &Actor, title: &str) -> Post {
        let post = self.submit(author, title).await;
        self.moderation
            .approve(Some(admin), post.id)
            .await
            .unwrap()
    }
}

pub fn display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Content made of `n` words, long enough to pass validation for n >= 20.
pub fn words(n: usize) -> String {
    vec!["woodland"; n].join(" ")
}

pub fn new_post(title: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: words(120),
        ..Default::default()
    }
}
