//! Hearts and comments on published posts.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Actor, Comment, Heart, Post};
use crate::error::DomainError;
use crate::ports::{CommentRepository, HeartRepository, PostRepository, UserRepository};

use super::views::{AuthorProfile, CommentView};
use super::{char_len, require_user};

pub const COMMENT_MAX_CHARS: usize = 500;

/// Outcome of a heart toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartToggle {
    pub is_hearted: bool,
    pub hearts: i64,
}

pub struct EngagementService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    hearts: Arc<dyn HeartRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl EngagementService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        hearts: Arc<dyn HeartRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            posts,
            users,
            hearts,
            comments,
        }
    }

    /// Heart the post, or take the heart back if the caller already gave one.
    ///
    /// The heart record decides the outcome: removal and insertion are each
    /// single statements, and the (user, post) unique key settles concurrent
    /// inserts. The counter only moves when a record was actually added or removed.
    pub async fn toggle_heart(
        &self,
        actor: Option<&Actor>,
        post_id: Uuid,
    ) -> Result<HeartToggle, DomainError> {
        let actor = require_user(actor)?;
        let post = self.published_post(post_id).await?;

        if self.hearts.remove(actor.user_id, post_id).await? {
            let hearts = self.adjust_counters(&post, -1).await?;
            tracing::debug!(post_id = %post_id, user_id = %actor.user_id, hearts, "Heart removed");
            return Ok(HeartToggle {
                is_hearted: false,
                hearts,
            });
        }

        if self.hearts.insert(Heart::new(actor.user_id, post_id)).await? {
            let hearts = self.adjust_counters(&post, 1).await?;
            tracing::debug!(post_id = %post_id, user_id = %actor.user_id, hearts, "Post hearted");
            return Ok(HeartToggle {
                is_hearted: true,
                hearts,
            });
        }

        // A concurrent request from the same user inserted the heart first.
        let hearts = self
            .posts
            .find_by_id(post_id)
            .await?
            .map_or(post.hearts, |p| p.hearts);
        Ok(HeartToggle {
            is_hearted: true,
            hearts,
        })
    }

    /// Append a comment and return it with its author for display.
    pub async fn add_comment(
        &self,
        actor: Option<&Actor>,
        post_id: Uuid,
        content: &str,
    ) -> Result<CommentView, DomainError> {
        let actor = require_user(actor)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::invalid("content", "Comment cannot be empty"));
        }
        if char_len(content) > COMMENT_MAX_CHARS {
            return Err(DomainError::invalid(
                "content",
                format!("Comment must be at most {COMMENT_MAX_CHARS} characters"),
            ));
        }

        let post = self.published_post(post_id).await?;
        let author = self
            .users
            .find_by_id(actor.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", actor.user_id))?;

        let comment = self
            .comments
            .append(Comment::new(post.id, author.id, content.to_string()))
            .await?;

        tracing::info!(post_id = %post.id, comment_id = %comment.id, "Comment added");

        Ok(CommentView {
            comment,
            author: Some(AuthorProfile::from(&author)),
        })
    }

    /// Engagement is only possible on posts readers can see.
    async fn published_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .filter(Post::is_published)
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    /// Move the post's heart count and the author's total together.
    async fn adjust_counters(&self, post: &Post, delta: i64) -> Result<i64, DomainError> {
        let hearts = self
            .posts
            .add_hearts(post.id, delta)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post.id))?;

        if let Err(e) = self.users.add_hearts_received(post.author_id, delta).await {
            tracing::warn!(author_id = %post.author_id, error = %e, "Failed to update author heart total");
        }

        Ok(hearts)
    }
}
