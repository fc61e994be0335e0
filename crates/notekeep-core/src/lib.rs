//! # notekeep-core
//!
//! Core types, traits, and abstractions for notekeep.
//!
//! This crate provides the data model, the error type and the collaborator
//! traits (identity, data, storage) that the other notekeep crates build on.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod logging;
pub mod models;
pub mod storage_key;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result, ServiceError};
pub use file_safety::{
    is_valid_mime_type, resolve_content_type, sanitize_filename, validate_file, FileVerdict,
};
pub use models::*;
pub use storage_key::{image_key, image_key_with_id, validate_key};
pub use traits::*;
