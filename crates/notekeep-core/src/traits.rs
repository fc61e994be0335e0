//! Collaborator traits for notekeep.
//!
//! The notes controller talks to three external services through these
//! interfaces. Concrete backends (PostgreSQL, filesystem, in-process) live
//! in `notekeep-db`; tests substitute mocks.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// IDENTITY
// =============================================================================

/// Presents the sign-in gate and reports the authenticated session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` when no session exists.
    async fn current_user(&self) -> Result<Option<User>>;

    /// End the current session.
    async fn sign_out(&self) -> Result<()>;
}

// =============================================================================
// DATA SERVICE
// =============================================================================

/// Persistence for note records.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Fetch every note.
    ///
    /// Per-item failures are reported in [`ListNotesResponse::errors`]
    /// rather than as an `Err`; `Err` is reserved for the whole request
    /// failing.
    async fn list(&self) -> Result<ListNotesResponse>;

    /// Create a note. The service assigns `id` and `created_at`.
    async fn create(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Delete a note. Returns `Error::NoteNotFound` when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// STORAGE SERVICE
// =============================================================================

/// Blob storage for note images.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Store `data` under `key`, replacing any existing object.
    async fn upload(&self, key: &str, data: &[u8], options: UploadOptions) -> Result<()>;

    /// A time-limited URL granting read access to the object at `key`.
    ///
    /// Returns `Error::NotFound` when no object exists at `key`.
    async fn get_display_url(&self, key: &str) -> Result<String>;

    /// Remove the object at `key`. Returns `Error::NotFound` when absent.
    async fn remove(&self, key: &str) -> Result<()>;
}
