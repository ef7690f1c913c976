//! Notification port - outbound messages to users.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What happened, with the data needed to tell the recipient about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    PostApproved { title: String, slug: String },
    PostRejected { title: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub email: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: NotificationKind,
}

/// Accepts notifications for delivery.
///
/// Implementations must return quickly: callers invoke this inline with a
/// state transition and only log a failure.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Delivers a single notification, e.g. over SMTP.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification queue is full")]
    QueueFull,

    #[error("Notification queue closed")]
    QueueClosed,

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}
