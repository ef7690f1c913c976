//! Author notifications: the delivery queue, email rendering and mailers.

mod log;
mod queue;
mod templates;

#[cfg(feature = "smtp")]
mod smtp;

pub use log::LogMailer;
pub use queue::{NotifyQueueConfig, NotifyStats, QueuedNotifier};
pub use templates::{RenderedEmail, render};

#[cfg(feature = "smtp")]
pub use smtp::{SmtpConfig, SmtpMailer};
