//! Core data models for notekeep.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::error::{Error, Result, ServiceError};

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A note record as owned by the data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    /// Display title, trimmed and non-empty.
    pub name: String,
    /// Free text, trimmed; may be empty.
    #[serde(default)]
    pub description: String,
    /// Storage key of the attached image, set only at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
    /// Assigned by the data service; `None` when the backend did not report one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A note as displayed: the record plus a display URL resolved for this fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteCard {
    #[serde(flatten)]
    pub note: Note,
    /// Time-limited URL for the note's image; never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NoteCard {
    /// A card with no resolved image.
    pub fn without_image(note: Note) -> Self {
        Self {
            note,
            image_url: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.note.id
    }
}

/// Ordering for the note list: newest first, undated notes last.
///
/// Missing timestamps are normalized explicitly instead of relying on how an
/// empty value happens to compare.
pub fn newest_first(a: &Note, b: &Note) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// =============================================================================
// DATA SERVICE REQUESTS
// =============================================================================

/// Request for creating a new note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
}

impl CreateNoteRequest {
    /// Build a request from raw form input, trimming name and description.
    pub fn new(name: &str, description: &str, image_key: Option<String>) -> Self {
        Self {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            image_key,
        }
    }

    /// Backends call this before persisting.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("note name must not be empty".to_string()));
        }
        if matches!(&self.image_key, Some(key) if key.is_empty()) {
            return Err(Error::InvalidInput("image key must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Response for listing notes.
///
/// A non-empty `errors` means the service could not produce some items; the
/// response as a whole should not be trusted as a complete snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListNotesResponse {
    pub data: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ServiceError>,
}

impl ListNotesResponse {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// =============================================================================
// STORAGE TYPES
// =============================================================================

/// Options for a storage upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions {
    pub content_type: String,
}

impl UploadOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
        }
    }
}

/// A binary payload picked by the user for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    /// Type reported by the picker, if any.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

// =============================================================================
// IDENTITY TYPES
// =============================================================================

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
