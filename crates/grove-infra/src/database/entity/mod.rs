//! SeaORM entities.

pub mod comment;
pub mod heart;
pub mod post;
pub mod user;
