//! SMTP mailer using lettre.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use grove_core::ports::{Mailer, Notification, NotifyError};

use super::templates::render;

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address; defaults to the SMTP username.
    pub from: String,
}

impl SmtpConfig {
    /// Returns `None` when `SMTP_HOST` is unset.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;
        let username = std::env::var("SMTP_USER").ok().filter(|u| !u.is_empty());
        let from = std::env::var("MAIL_FROM")
            .ok()
            .or_else(|| username.clone())
            .unwrap_or_else(|| "noreply@localhost".to_string());

        Some(Self {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username,
            password: std::env::var("SMTP_PASS").ok(),
            from,
        })
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    site_url: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, site_url: impl Into<String>) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| NotifyError::Message(format!("invalid sender address: {e}")))?;

        // STARTTLS on the submission port, as most relays expect.
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Delivery(e.to_string()))?
            .port(config.port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        tracing::info!(host = %config.host, port = config.port, "SMTP mailer configured");

        Ok(Self {
            transport: builder.build(),
            from,
            site_url: site_url.into(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = render(notification, &self.site_url);

        let to = Mailbox::new(
            Some(notification.name.clone()),
            notification
                .email
                .parse()
                .map_err(|e| NotifyError::Message(format!("invalid recipient address: {e}")))?,
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        Ok(())
    }
}
