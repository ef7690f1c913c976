use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Pending,
    Published,
    Rejected,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Pending => "pending",
            PostStatus::Published => "published",
            PostStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PostStatus::Pending),
            "published" => Ok(PostStatus::Published),
            "rejected" => Ok(PostStatus::Rejected),
            other => Err(format!("unknown post status: {other}")),
        }
    }
}

/// Moderation state together with the data that only exists in that state.
///
/// `published_at` and `rejection_reason` cannot be set on the wrong status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Moderation {
    Pending,
    Published { published_at: DateTime<Utc> },
    Rejected { reason: String },
}

impl Moderation {
    pub fn status(&self) -> PostStatus {
        match self {
            Moderation::Pending => PostStatus::Pending,
            Moderation::Published { .. } => PostStatus::Published,
            Moderation::Rejected { .. } => PostStatus::Rejected,
        }
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Moderation::Published { published_at } => Some(*published_at),
            _ => None,
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Moderation::Rejected { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Cover image hosted by the media service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    pub url: String,
    /// Identifier used to delete the image from the host, when known.
    pub delete_id: Option<String>,
}

/// Post entity - a submitted blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: Option<CoverImage>,
    pub moderation: Moderation,
    /// Minutes, at least 1.
    pub reading_time: i32,
    /// Live heart count, kept in step with the heart records.
    pub hearts: i64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn status(&self) -> PostStatus {
        self.moderation.status()
    }

    pub fn is_published(&self) -> bool {
        self.status() == PostStatus::Published
    }
}
