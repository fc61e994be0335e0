//! View events and the broadcast bus that carries them.
//!
//! A renderer subscribes to learn when the note snapshot or the form state
//! changed. Emitting with no subscribers drops the event.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Something observable happened in a [`NotesView`](crate::NotesView).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    /// The note snapshot was replaced.
    NotesRefreshed { count: usize },
    /// A refresh was abandoned because the data service reported item errors.
    RefreshAborted { errors: Vec<String> },
    NoteCreated { id: Uuid },
    CreateFailed { message: String },
    NoteDeleted { id: Uuid },
    SignedOut,
}

impl ViewEvent {
    /// Dot-namespaced event name for logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::NotesRefreshed { .. } => "notes.refreshed",
            Self::RefreshAborted { .. } => "notes.refresh_aborted",
            Self::NoteCreated { .. } => "note.created",
            Self::CreateFailed { .. } => "note.create_failed",
            Self::NoteDeleted { .. } => "note.deleted",
            Self::SignedOut => "session.signed_out",
        }
    }
}

/// Broadcast bus for [`ViewEvent`]s.
pub struct EventBus {
    tx: broadcast::Sender<ViewEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn emit(&self, event: ViewEvent) {
        tracing::debug!(
            event_type = event.event_type(),
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(event);
    }

    /// Each subscriber gets its own independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
