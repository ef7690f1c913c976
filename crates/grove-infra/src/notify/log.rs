//! Mailer that writes notifications to the log - used when SMTP is not configured.

use async_trait::async_trait;

use grove_core::ports::{Mailer, Notification, NotifyError};

use super::templates::render;

pub struct LogMailer {
    site_url: String,
}

impl LogMailer {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = render(notification, &self.site_url);
        tracing::info!(
            target: "grove::mail",
            recipient = %notification.name,
            subject = %email.subject,
            "Email (not sent, SMTP not configured)\n{}",
            email.text
        );
        Ok(())
    }
}
