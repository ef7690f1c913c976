//! Image host adapters.

mod memory;

#[cfg(feature = "cloudinary")]
mod cloudinary;

pub use memory::InMemoryMediaStore;

#[cfg(feature = "cloudinary")]
pub use cloudinary::{CloudinaryConfig, CloudinaryMediaStore};
