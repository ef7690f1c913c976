//! Application services - the operations exposed to the HTTP layer.
//!
//! Every operation takes the caller as `Option<&Actor>`; `None` means the
//! request carried no valid session.

mod accounts;
mod engagement;
mod media;
mod moderation;
mod posts;
mod views;

pub use accounts::{AccountService, SignInProfile};
pub use engagement::{COMMENT_MAX_CHARS, EngagementService, HeartToggle};
pub use media::UploadService;
pub use moderation::{ModerationService, REJECTION_REASON_MAX_CHARS};
pub use posts::{NewPost, PostService, PostingPolicy, start_of_day};
pub use views::{
    AuthorDashboard, AuthorProfile, AuthorStats, CommentView, MAX_PAGE, Page, PageRequest, PostDetail,
    PostSummary, SitemapEntry,
};

use crate::domain::Actor;
use crate::error::DomainError;
use crate::ports::UserRepository;

/// The caller, or `Unauthenticated`.
pub(crate) fn require_user(actor: Option<&Actor>) -> Result<Actor, DomainError> {
    actor.copied().ok_or(DomainError::Unauthenticated)
}

/// The caller if its stored account is an administrator.
///
/// The role is read from the user record rather than the session, so a
/// promotion or demotion applies to sessions already issued.
pub(crate) async fn require_admin(
    users: &dyn UserRepository,
    actor: Option<&Actor>,
) -> Result<Actor, DomainError> {
    let actor = require_user(actor)?;
    let role = users
        .find_by_id(actor.user_id)
        .await?
        .map(|user| user.role)
        .unwrap_or_default();
    let actor = Actor::new(actor.user_id, role);
    if !actor.is_admin() {
        tracing::warn!(user_id = %actor.user_id, "Non-admin attempted a moderation action");
        return Err(DomainError::Forbidden);
    }
    Ok(actor)
}

/// Length of `value` in characters, the unit every text limit is expressed in.
pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}
