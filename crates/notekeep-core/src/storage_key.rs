//! Storage key generation and validation.

use uuid::Uuid;

use crate::defaults::IMAGE_KEY_PREFIX;
use crate::error::{Error, Result};
use crate::file_safety::sanitize_filename;

/// Generate the storage key for a newly attached image.
///
/// Format: `images/{uuid-v7}_{sanitized file name}`. The UUIDv7 carries a
/// millisecond timestamp prefix plus random bits, so keys sort by upload
/// time and two uploads of the same file name never collide.
pub fn image_key(file_name: &str) -> String {
    image_key_with_id(Uuid::now_v7(), file_name)
}

/// Same as [`image_key`] with a caller-chosen id.
pub fn image_key_with_id(id: Uuid, file_name: &str) -> String {
    format!("{}{}_{}", IMAGE_KEY_PREFIX, id, sanitize_filename(file_name))
}

/// Reject keys that could escape a storage root or are otherwise unusable.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidInput("storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') || key.contains('\0') {
        return Err(Error::InvalidInput(format!(
            "storage key has an illegal character: {:?}",
            key
        )));
    }
    if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(Error::InvalidInput(format!(
            "storage key has an illegal path segment: {:?}",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_key_contains_file_name() {
        let key = image_key("beach.jpg");
        assert!(key.starts_with("images/"));
        assert!(key.ends_with("_beach.jpg"));
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn test_image_keys_do_not_collide() {
        assert_ne!(image_key("beach.jpg"), image_key("beach.jpg"));
    }

    #[test]
    fn test_image_key_sanitizes_path_components() {
        let key = image_key_with_id(Uuid::nil(), "../../secret.png");
        assert_eq!(
            key,
            "images/00000000-0000-0000-0000-000000000000_secret.png"
        );
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("images/../../etc").is_err());
        assert!(validate_key("images//a.png").is_err());
        assert!(validate_key("images\\a.png").is_err());
    }
}
