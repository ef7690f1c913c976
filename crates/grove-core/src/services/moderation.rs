//! Admin-only moderation: approve, reject and delete posts.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Actor, Post, PostStatus};
use crate::error::{DomainError, RepoError};
use crate::ports::{
    HeartRepository, MediaStore, Notification, NotificationKind, Notifier, PostRepository,
    UserRepository,
};

use super::{char_len, require_admin};

pub const REJECTION_REASON_MAX_CHARS: usize = 500;

pub struct ModerationService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    hearts: Arc<dyn HeartRepository>,
    media: Arc<dyn MediaStore>,
    notifier: Arc<dyn Notifier>,
}

impl ModerationService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        hearts: Arc<dyn HeartRepository>,
        media: Arc<dyn MediaStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            posts,
            users,
            hearts,
            media,
            notifier,
        }
    }

    /// Publish a pending post and credit its author.
    pub async fn approve(&self, actor: Option<&Actor>, post_id: Uuid) -> Result<Post, DomainError> {
        let admin = require_admin(self.users.as_ref(), actor).await?;

        let Some(post) = self.posts.publish(post_id, Utc::now()).await? else {
            return Err(self.transition_failure(post_id, PostStatus::Published).await);
        };

        self.users.add_posts_count(post.author_id, 1).await?;

        tracing::info!(
            post_id = %post.id,
            author_id = %post.author_id,
            admin_id = %admin.user_id,
            "Post approved"
        );

        self.notify_author(
            &post,
            NotificationKind::PostApproved {
                title: post.title.clone(),
                slug: post.slug.clone(),
            },
        )
        .await;

        Ok(post)
    }

    /// Reject a pending post with a reason shown to its author.
    pub async fn reject(
        &self,
        actor: Option<&Actor>,
        post_id: Uuid,
        reason: &str,
    ) -> Result<Post, DomainError> {
        let admin = require_admin(self.users.as_ref(), actor).await?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::invalid("reason", "Rejection reason is required"));
        }
        if char_len(reason) > REJECTION_REASON_MAX_CHARS {
            return Err(DomainError::invalid(
                "reason",
                format!("Rejection reason must be at most {REJECTION_REASON_MAX_CHARS} characters"),
            ));
        }

        let Some(post) = self.posts.reject(post_id, reason, Utc::now()).await? else {
            return Err(self.transition_failure(post_id, PostStatus::Rejected).await);
        };

        tracing::info!(
            post_id = %post.id,
            author_id = %post.author_id,
            admin_id = %admin.user_id,
            "Post rejected"
        );

        self.notify_author(
            &post,
            NotificationKind::PostRejected {
                title: post.title.clone(),
                reason: reason.to_string(),
            },
        )
        .await;

        Ok(post)
    }

    /// Remove a post in any state, with its hearts and cover image.
    pub async fn delete(&self, actor: Option<&Actor>, post_id: Uuid) -> Result<(), DomainError> {
        let admin = require_admin(self.users.as_ref(), actor).await?;

        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;

        if let Some(delete_id) = post.cover_image.as_ref().and_then(|c| c.delete_id.as_deref()) {
            if let Err(e) = self.media.delete(delete_id).await {
                tracing::warn!(post_id = %post_id, delete_id, error = %e, "Failed to delete cover image");
            }
        }

        let removed_hearts = self.hearts.delete_for_post(post_id).await?;

        match self.posts.delete(post_id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(DomainError::not_found("post", post_id)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            post_id = %post_id,
            admin_id = %admin.user_id,
            removed_hearts,
            "Post deleted"
        );

        Ok(())
    }

    /// Why a conditional transition matched nothing: missing, or not pending.
    async fn transition_failure(&self, post_id: Uuid, to: PostStatus) -> DomainError {
        match self.posts.find_by_id(post_id).await {
            Ok(Some(post)) => DomainError::InvalidTransition {
                from: post.status(),
                to,
            },
            Ok(None) => DomainError::not_found("post", post_id),
            Err(e) => e.into(),
        }
    }

    /// Hand a notification to the dispatcher. Failures are logged, never returned.
    async fn notify_author(&self, post: &Post, kind: NotificationKind) {
        let author = match self.users.find_by_id(post.author_id).await {
            Ok(Some(author)) => author,
            Ok(None) => {
                tracing::warn!(post_id = %post.id, "Author not found, skipping notification");
                return;
            }
            Err(e) => {
                tracing::warn!(post_id = %post.id, error = %e, "Author lookup failed, skipping notification");
                return;
            }
        };

        let notification = Notification {
            email: author.email,
            name: author.name,
            kind,
        };

        if let Err(e) = self.notifier.notify(notification).await {
            tracing::error!(post_id = %post.id, error = %e, "Failed to queue author notification");
        }
    }
}
