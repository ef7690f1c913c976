//! Read models returned by the services.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Comment, Post, User};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 50;
/// Highest page number; keeps the row offset within a signed 64-bit SQL bind.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

/// Public projection of a user, used wherever an author is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorProfile {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

impl From<&User> for AuthorProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            image: user.image.clone(),
        }
    }
}

/// A post with its author populated, for listings.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub post: Post,
    /// `None` if the author record is gone.
    pub author: Option<AuthorProfile>,
    pub comment_count: u64,
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Option<AuthorProfile>,
}

/// A published post as shown on its own page.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub author: Option<AuthorProfile>,
    pub comments: Vec<CommentView>,
    /// Whether the viewer has hearted the post; `false` for anonymous viewers.
    pub is_hearted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorStats {
    pub total_posts: u64,
    pub total_hearts: i64,
    pub total_comments: u64,
}

/// An author's own posts in every state, with aggregate stats.
#[derive(Debug, Clone)]
pub struct AuthorDashboard {
    pub posts: Vec<PostSummary>,
    pub stats: AuthorStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub slug: String,
    pub updated_at: DateTime<Utc>,
}

/// 1-based page request. Out-of-range values are clamped by [`PageRequest::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE),
        }
        .normalized()
    }

    pub fn normalized(self) -> Self {
        Self {
            page: self.page.clamp(1, MAX_PAGE),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(request.limit),
        }
    }
}

/// Pair each post with its author and comment count.
pub(crate) fn summarize(
    posts: Vec<Post>,
    authors: &HashMap<Uuid, AuthorProfile>,
    comment_counts: &HashMap<Uuid, u64>,
) -> Vec<PostSummary> {
    posts
        .into_iter()
        .map(|post| PostSummary {
            author: authors.get(&post.author_id).cloned(),
            comment_count: comment_counts.get(&post.id).copied().unwrap_or(0),
            post,
        })
        .collect()
}

pub(crate) fn profiles_by_id(users: &[User]) -> HashMap<Uuid, AuthorProfile> {
    users.iter().map(|u| (u.id, AuthorProfile::from(u))).collect()
}
