use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Comment, Heart, Post, PostStatus, User};
use crate::error::RepoError;

/// Generic repository trait for entities addressed by a primary key.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique-key collisions surface as [`RepoError::Constraint`].
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (already lower-cased) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Load several users at once, for populating author references.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepoError>;

    /// Atomically add `delta` to `posts_count`.
    async fn add_posts_count(&self, id: Uuid, delta: i64) -> Result<(), RepoError>;

    /// Atomically add `delta` to `hearts_received`.
    async fn add_hearts_received(&self, id: Uuid, delta: i64) -> Result<(), RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError>;

    /// Number of posts created by `author_id` at or after `since`.
    async fn count_by_author_since(
        &self,
        author_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<u64, RepoError>;

    /// All posts of an author, newest first.
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// Published posts, most recently published first.
    async fn list_published(&self, offset: u64, limit: u64) -> Result<Vec<Post>, RepoError>;

    async fn count_by_status(&self, status: PostStatus) -> Result<u64, RepoError>;

    /// Every post regardless of status, newest first.
    async fn list_all(&self) -> Result<Vec<Post>, RepoError>;

    /// Move a pending post to published. Returns `None` when the post is
    /// missing or no longer pending; nothing is written in that case.
    async fn publish(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Post>, RepoError>;

    /// Move a pending post to rejected. Same contract as [`PostRepository::publish`].
    async fn reject(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError>;

    /// Atomically add `delta` to the heart counter and return the new value.
    /// Returns `None` when the post does not exist.
    async fn add_hearts(&self, id: Uuid, delta: i64) -> Result<Option<i64>, RepoError>;
}

/// Heart repository. The (user, post) pair is unique.
#[async_trait]
pub trait HeartRepository: Send + Sync {
    /// Insert a heart. Returns `false` if the pair already existed.
    async fn insert(&self, heart: Heart) -> Result<bool, RepoError>;

    /// Remove the heart for the pair. Returns `false` if none existed.
    async fn remove(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError>;

    async fn exists(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError>;

    /// Delete every heart on a post, returning how many were removed.
    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, RepoError>;

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

/// Comment repository. Comments are append-only.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn append(&self, comment: Comment) -> Result<Comment, RepoError>;

    /// Comments on a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;

    /// Comment counts keyed by post. Posts without comments may be absent.
    async fn count_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError>;
}
