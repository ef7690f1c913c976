//! Domain entities - the core business objects.

mod engagement;
mod post;
mod user;

pub use engagement::{Comment, Heart};
pub use post::{CoverImage, Moderation, Post, PostStatus};
pub use user::{Actor, Role, User};
pub(crate) use user::normalize_email;
