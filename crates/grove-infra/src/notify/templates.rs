//! Email bodies for moderation outcomes.

use grove_core::ports::{Notification, NotificationKind};

const SIGNATURE: &str = "The Grove Team";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Render the email for a notification. Links point at `site_url`.
pub fn render(notification: &Notification, site_url: &str) -> RenderedEmail {
    let site_url = site_url.trim_end_matches('/');

    match &notification.kind {
        NotificationKind::PostApproved { title, slug } => {
            let link = format!("{site_url}/posts/{slug}");
            RenderedEmail {
                subject: format!("Post Approved: {title}"),
                html: format!(
                    r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #228B22;">Post Approved!</h2>
  <p>Congratulations! Your post <strong>"{title}"</strong> has been approved and is now live.</p>
  <p><a href="{link}" style="color: #228B22;">View your post</a></p>
  <p>Best regards,<br>{SIGNATURE}</p>
</div>"#,
                    title = escape_html(title),
                    link = escape_html(&link),
                ),
                text: format!(
                    "Congratulations! Your post \"{title}\" has been approved and is now live.\n\n\
                     View your post: {link}\n\n{SIGNATURE}\n"
                ),
            }
        }
        NotificationKind::PostRejected { title, reason } => RenderedEmail {
            subject: format!("Post Rejected: {title}"),
            html: format!(
                r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #8B4513;">Post Submission Update</h2>
  <p>Unfortunately, your post <strong>"{title}"</strong> has been rejected.</p>
  <p><strong>Reason:</strong> {reason}</p>
  <p>Please review the feedback and feel free to resubmit with improvements.</p>
  <p>Best regards,<br>{SIGNATURE}</p>
</div>"#,
                title = escape_html(title),
                reason = escape_html(reason),
            ),
            text: format!(
                "Unfortunately, your post \"{title}\" has been rejected.\n\n\
                 Reason: {reason}\n\n\
                 Please review the feedback and feel free to resubmit with improvements.\n\n\
                 {SIGNATURE}\n"
            ),
        },
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(kind: NotificationKind) -> Notification {
        Notification {
            email: "author@example.com".to_string(),
            name: "Author".to_string(),
            kind,
        }
    }

    #[test]
    fn approval_links_to_post() {
        let email = render(
            &notification(NotificationKind::PostApproved {
                title: "Hello World".to_string(),
                slug: "hello-world".to_string(),
            }),
            "https://grove.example/",
        );

        assert_eq!(email.subject, "Post Approved: Hello World");
        assert!(email.html.contains(r#"href="https://grove.example/posts/hello-world""#));
        assert!(email.text.contains("https://grove.example/posts/hello-world"));
    }

    #[test]
    fn rejection_includes_escaped_reason() {
        let email = render(
            &notification(NotificationKind::PostRejected {
                title: "Tags & <Things>".to_string(),
                reason: "Contains <script>".to_string(),
            }),
            "http://localhost:3000",
        );

        assert_eq!(email.subject, "Post Rejected: Tags & <Things>");
        assert!(email.html.contains("Tags &amp; &lt;Things&gt;"));
        assert!(email.html.contains("Contains &lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
        assert!(email.text.contains("Reason: Contains <script>"));
    }
}
