//! In-process data service.
//!
//! Keeps notes in a `RwLock<HashMap>`; used when no database is configured
//! and as the backing store for the test mocks.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use notekeep_core::{CreateNoteRequest, DataService, Error, ListNotesResponse, Note, Result};

/// In-memory implementation of [`DataService`].
#[derive(Default)]
pub struct MemoryNoteRepository {
    notes: RwLock<HashMap<Uuid, Note>>,
}

impl MemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed note, bypassing id and timestamp assignment.
    pub async fn seed(&self, note: Note) {
        self.notes.write().await.insert(note.id, note);
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

#[async_trait]
impl DataService for MemoryNoteRepository {
    async fn list(&self) -> Result<ListNotesResponse> {
        let notes = self.notes.read().await;
        // HashMap order is arbitrary; callers sort.
        Ok(ListNotesResponse {
            data: notes.values().cloned().collect(),
            errors: Vec::new(),
        })
    }

    async fn create(&self, req: CreateNoteRequest) -> Result<Note> {
        req.validate()?;

        let note = Note {
            id: Uuid::now_v7(),
            name: req.name,
            description: req.description,
            image_key: req.image_key,
            created_at: Some(Utc::now()),
        };
        self.notes.write().await.insert(note.id, note.clone());
        debug!(subsystem = "db", component = "memory", op = "create", note_id = %note.id, "Inserted note");
        Ok(note)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        match self.notes.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(Error::NoteNotFound(id)),
        }
    }
}
