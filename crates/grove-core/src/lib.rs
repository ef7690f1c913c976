//! # Grove Core
//!
//! The domain layer of the Grove blog backend.
//! Post lifecycle, moderation and engagement rules live here, expressed against
//! the ports in [`ports`] so that no infrastructure crate is needed to run them.

pub mod content;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, FieldError};
