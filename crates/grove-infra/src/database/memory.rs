//! In-memory persistence - used when no database is configured, and in tests.
//!
//! All four repositories share one state behind an async RwLock, so deleting
//! a post also drops its hearts and comments, the way foreign key cascades
//! do in PostgreSQL. Data is lost on process restart.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use grove_core::domain::{Comment, Heart, Moderation, Post, PostStatus, User};
use grove_core::error::RepoError;
use grove_core::ports::{
    BaseRepository, CommentRepository, HeartRepository, PostRepository, UserRepository,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    hearts: HashMap<(Uuid, Uuid), Heart>,
    comments: Vec<Comment>,
}

/// Shared in-memory state handing out the repository adapters.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            state: self.state.clone(),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            state: self.state.clone(),
        }
    }

    pub fn hearts(&self) -> InMemoryHeartRepository {
        InMemoryHeartRepository {
            state: self.state.clone(),
        }
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository {
            state: self.state.clone(),
        }
    }
}

pub struct InMemoryUserRepository {
    state: Arc<RwLock<State>>,
}

pub struct InMemoryPostRepository {
    state: Arc<RwLock<State>>,
}

pub struct InMemoryHeartRepository {
    state: Arc<RwLock<State>>,
}

pub struct InMemoryCommentRepository {
    state: Arc<RwLock<State>>,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&user.id) {
            return Err(RepoError::Constraint("users_pkey".to_string()));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("users_email_key".to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        let owned: HashSet<Uuid> = state
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        state.posts.retain(|post_id, _| !owned.contains(post_id));
        state
            .hearts
            .retain(|(user_id, post_id), _| *user_id != id && !owned.contains(post_id));
        state
            .comments
            .retain(|c| c.author_id != id && !owned.contains(&c.post_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.last_login = at;
        user.updated_at = at;
        Ok(())
    }

    async fn add_posts_count(&self, id: Uuid, delta: i64) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.posts_count += delta;
        Ok(())
    }

    async fn add_hearts_received(&self, id: Uuid, delta: i64) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.hearts_received += delta;
        Ok(())
    }
}

/// Newest first, by publication time and then creation time.
fn by_recency(a: &Post, b: &Post) -> std::cmp::Ordering {
    b.moderation
        .published_at()
        .cmp(&a.moderation.published_at())
        .then(b.created_at.cmp(&a.created_at))
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut state = self.state.write().await;
        if state.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("posts_pkey".to_string()));
        }
        if state.posts.values().any(|p| p.slug == post.slug) {
            return Err(RepoError::Constraint("posts_slug_key".to_string()));
        }
        if !state.users.contains_key(&post.author_id) {
            return Err(RepoError::ForeignKey("fk_posts_author".to_string()));
        }
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        if state.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        state.hearts.retain(|(_, post_id), _| *post_id != id);
        state.comments.retain(|c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let state = self.state.read().await;
        Ok(state.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let state = self.state.read().await;
        Ok(state.posts.values().any(|p| p.slug == slug))
    }

    async fn count_by_author_since(
        &self,
        author_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<u64, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .values()
            .filter(|p| p.author_id == author_id && p.created_at >= since)
            .count() as u64)
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn list_published(&self, offset: u64, limit: u64) -> Result<Vec<Post>, RepoError> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|p| p.is_published())
            .cloned()
            .collect();
        posts.sort_by(by_recency);
        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_by_status(&self, status: PostStatus) -> Result<u64, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .values()
            .filter(|p| p.status() == status)
            .count() as u64)
    }

    async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state.posts.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn publish(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Post>, RepoError> {
        let mut state = self.state.write().await;
        Ok(state
            .posts
            .get_mut(&id)
            .filter(|p| p.status() == PostStatus::Pending)
            .map(|post| {
                post.moderation = Moderation::Published { published_at: at };
                post.updated_at = at;
                post.clone()
            }))
    }

    async fn reject(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError> {
        let mut state = self.state.write().await;
        Ok(state
            .posts
            .get_mut(&id)
            .filter(|p| p.status() == PostStatus::Pending)
            .map(|post| {
                post.moderation = Moderation::Rejected {
                    reason: reason.to_string(),
                };
                post.updated_at = at;
                post.clone()
            }))
    }

    async fn add_hearts(&self, id: Uuid, delta: i64) -> Result<Option<i64>, RepoError> {
        let mut state = self.state.write().await;
        Ok(state.posts.get_mut(&id).map(|post| {
            post.hearts += delta;
            post.hearts
        }))
    }
}

#[async_trait]
impl HeartRepository for InMemoryHeartRepository {
    async fn insert(&self, heart: Heart) -> Result<bool, RepoError> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&heart.post_id) {
            return Err(RepoError::ForeignKey("fk_hearts_post".to_string()));
        }
        let key = (heart.user_id, heart.post_id);
        if state.hearts.contains_key(&key) {
            return Ok(false);
        }
        state.hearts.insert(key, heart);
        Ok(true)
    }

    async fn remove(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let mut state = self.state.write().await;
        Ok(state.hearts.remove(&(user_id, post_id)).is_some())
    }

    async fn exists(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let state = self.state.read().await;
        Ok(state.hearts.contains_key(&(user_id, post_id)))
    }

    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let mut state = self.state.write().await;
        let before = state.hearts.len();
        state.hearts.retain(|(_, p), _| *p != post_id);
        Ok((before - state.hearts.len()) as u64)
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let state = self.state.read().await;
        Ok(state.hearts.keys().filter(|(_, p)| *p == post_id).count() as u64)
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn append(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(RepoError::ForeignKey("fk_comments_post".to_string()));
        }
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn count_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        let wanted: HashSet<&Uuid> = post_ids.iter().collect();
        let state = self.state.read().await;
        let mut counts = HashMap::new();
        for comment in state.comments.iter().filter(|c| wanted.contains(&c.post_id)) {
            *counts.entry(comment.post_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_by(author_id: Uuid, slug: &str) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            author_id,
            title: "Title".to_string(),
            slug: slug.to_string(),
            content: "content".to_string(),
            excerpt: "content".to_string(),
            cover_image: None,
            moderation: Moderation::Pending,
            reading_time: 1,
            hearts: 0,
            tags: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    async fn seeded() -> (InMemoryStore, User) {
        let store = InMemoryStore::new();
        let user = User::new("author@example.com", "Author".to_string(), None);
        store.users().insert(user.clone()).await.unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn duplicate_email_is_a_constraint_violation() {
        let (store, _) = seeded().await;
        let again = User::new("author@example.com", "Other".to_string(), None);

        let result = store.users().insert(again).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_constraint_violation() {
        let (store, user) = seeded().await;
        let posts = store.posts();
        posts.insert(post_by(user.id, "hello")).await.unwrap();

        let result = posts.insert(post_by(user.id, "hello")).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn post_by_unknown_author_is_a_foreign_key_violation() {
        let (store, _) = seeded().await;

        let result = store.posts().insert(post_by(Uuid::new_v4(), "orphan")).await;
        assert!(matches!(result, Err(RepoError::ForeignKey(_))));
    }

    #[tokio::test]
    async fn publish_only_moves_pending_posts() {
        let (store, user) = seeded().await;
        let posts = store.posts();
        let post = posts.insert(post_by(user.id, "hello")).await.unwrap();

        let first = posts.publish(post.id, Utc::now()).await.unwrap();
        assert_eq!(first.map(|p| p.status()), Some(PostStatus::Published));

        assert!(posts.publish(post.id, Utc::now()).await.unwrap().is_none());
        assert!(posts.reject(post.id, "late", Utc::now()).await.unwrap().is_none());
        assert!(posts.publish(Uuid::new_v4(), Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn heart_pair_is_unique() {
        let (store, user) = seeded().await;
        let post = store.posts().insert(post_by(user.id, "hello")).await.unwrap();
        let hearts = store.hearts();

        assert!(hearts.insert(Heart::new(user.id, post.id)).await.unwrap());
        assert!(!hearts.insert(Heart::new(user.id, post.id)).await.unwrap());
        assert_eq!(hearts.count_for_post(post.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_a_post_cascades() {
        let (store, user) = seeded().await;
        let posts = store.posts();
        let post = posts.insert(post_by(user.id, "hello")).await.unwrap();
        store
            .hearts()
            .insert(Heart::new(user.id, post.id))
            .await
            .unwrap();
        store
            .comments()
            .append(Comment::new(post.id, user.id, "nice".to_string()))
            .await
            .unwrap();

        posts.delete(post.id).await.unwrap();

        assert!(!store.hearts().exists(user.id, post.id).await.unwrap());
        assert!(store.comments().list_for_post(post.id).await.unwrap().is_empty());
        assert!(matches!(posts.delete(post.id).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn comment_counts_skip_posts_without_comments() {
        let (store, user) = seeded().await;
        let posts = store.posts();
        let a = posts.insert(post_by(user.id, "a")).await.unwrap();
        let b = posts.insert(post_by(user.id, "b")).await.unwrap();
        let comments = store.comments();
        for text in ["one", "two"] {
            comments
                .append(Comment::new(a.id, user.id, text.to_string()))
                .await
                .unwrap();
        }

        let counts = comments.count_for_posts(&[a.id, b.id]).await.unwrap();
        assert_eq!(counts.get(&a.id), Some(&2));
        assert_eq!(counts.get(&b.id), None);
    }
}
