//! The notes view controller.
//!
//! [`NotesView`] owns the cached note snapshot and the form draft and drives
//! the collaborators in [`NotesContext`]. Every mutation is followed by a full
//! reload; the snapshot is never patched in place.

use std::sync::Mutex;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use notekeep_core::defaults::{EVENT_BUS_CAPACITY, SUBMIT_LABEL, SUBMIT_LABEL_BUSY};
use notekeep_core::{
    image_key, newest_first, resolve_content_type, validate_file, CreateNoteRequest, Error,
    FileVerdict, ImageFile, Note, NoteCard, Result, ServiceError, UploadOptions, User,
};

use crate::context::NotesContext;
use crate::draft::{lock, CreatingGuard, NoteDraft};
use crate::events::{EventBus, ViewEvent};

/// What the view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// No session; only the identity provider's sign-in gate is shown.
    SignIn,
    Notes(NotesPage),
}

/// The signed-in notes page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesPage {
    pub username: String,
    pub draft: NoteDraft,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub notes: Vec<NoteCard>,
    /// Message from the last failed create, until the next success.
    pub error: Option<String>,
}

impl NotesPage {
    pub fn greeting(&self) -> String {
        format!("Signed in as {}", self.username)
    }
}

/// Result of a [`NotesView::list`] call that reached the data service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot was replaced with `count` notes.
    Refreshed { count: usize },
    /// The service reported item errors; the previous snapshot was kept.
    Aborted { errors: Vec<ServiceError> },
}

/// Stateful controller for the notes page.
pub struct NotesView {
    ctx: NotesContext,
    notes: RwLock<Vec<NoteCard>>,
    draft: Mutex<NoteDraft>,
    last_error: Mutex<Option<String>>,
    events: EventBus,
}

impl NotesView {
    pub fn new(ctx: NotesContext) -> Self {
        Self {
            ctx,
            notes: RwLock::new(Vec::new()),
            draft: Mutex::new(NoteDraft::default()),
            last_error: Mutex::new(None),
            events: EventBus::new(EVENT_BUS_CAPACITY),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    // ─── State accessors ──────────────────────────────────────────────────

    /// The current note snapshot.
    pub async fn notes(&self) -> Vec<NoteCard> {
        self.notes.read().await.clone()
    }

    pub fn draft(&self) -> NoteDraft {
        lock(&self.draft).clone()
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    fn set_last_error(&self, message: Option<String>) {
        *lock(&self.last_error) = message;
    }

    // ─── Draft editing ────────────────────────────────────────────────────

    pub fn set_name(&self, name: impl Into<String>) {
        lock(&self.draft).name = name.into();
    }

    pub fn set_description(&self, description: impl Into<String>) {
        lock(&self.draft).description = description.into();
    }

    pub fn attach_file(&self, file: ImageFile) {
        lock(&self.draft).file = Some(file);
    }

    pub fn clear_file(&self) {
        lock(&self.draft).file = None;
    }

    // ─── Session ──────────────────────────────────────────────────────────

    async fn require_user(&self) -> Result<User> {
        self.ctx
            .identity
            .current_user()
            .await?
            .ok_or_else(|| Error::Unauthorized("sign in to manage notes".to_string()))
    }

    /// Build the screen for the current session and state.
    pub async fn render(&self) -> Result<Screen> {
        let Some(user) = self.ctx.identity.current_user().await? else {
            return Ok(Screen::SignIn);
        };
        let draft = self.draft();
        Ok(Screen::Notes(NotesPage {
            username: user.username,
            submit_enabled: !draft.creating,
            submit_label: if draft.creating {
                SUBMIT_LABEL_BUSY
            } else {
                SUBMIT_LABEL
            },
            notes: self.notes().await,
            error: self.last_error(),
            draft,
        }))
    }

    /// Initial load. Does nothing until a session exists.
    pub async fn mount(&self) -> Result<Option<RefreshOutcome>> {
        if self.ctx.identity.current_user().await?.is_none() {
            debug!(subsystem = "view", component = "notes_view", op = "mount", "No session; skipping initial load");
            return Ok(None);
        }
        self.list().await.map(Some)
    }

    /// End the session and drop everything cached for it.
    pub async fn sign_out(&self) -> Result<()> {
        self.ctx.identity.sign_out().await?;
        self.notes.write().await.clear();
        lock(&self.draft).clear_fields();
        self.set_last_error(None);
        self.events.emit(ViewEvent::SignedOut);
        info!(subsystem = "view", component = "notes_view", op = "sign_out", "Cleared view state after sign-out");
        Ok(())
    }

    // ─── Operations ───────────────────────────────────────────────────────

    /// Reload every note and resolve display URLs.
    ///
    /// Item errors from the data service abort the refresh and keep the
    /// previous snapshot. A failed URL lookup only drops that note's image.
    pub async fn list(&self) -> Result<RefreshOutcome> {
        self.require_user().await?;
        let start = Instant::now();

        let response = self.ctx.data.list().await.map_err(|e| {
            error!(subsystem = "view", component = "notes_view", op = "list", error = %e, "Listing notes failed");
            e
        })?;

        if response.has_errors() {
            error!(
                subsystem = "view",
                component = "notes_view",
                op = "list",
                error_count = response.errors.len(),
                errors = ?response.errors,
                "Data service reported item errors; keeping previous notes"
            );
            self.events.emit(ViewEvent::RefreshAborted {
                errors: response.errors.iter().map(ToString::to_string).collect(),
            });
            return Ok(RefreshOutcome::Aborted {
                errors: response.errors,
            });
        }

        let mut notes = response.data;
        notes.sort_by(newest_first);
        let cards = join_all(notes.into_iter().map(|note| self.resolve_card(note))).await;

        let count = cards.len();
        *self.notes.write().await = cards;

        debug!(
            subsystem = "view",
            component = "notes_view",
            op = "list",
            result_count = count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Refreshed notes"
        );
        self.events.emit(ViewEvent::NotesRefreshed { count });
        Ok(RefreshOutcome::Refreshed { count })
    }

    async fn resolve_card(&self, note: Note) -> NoteCard {
        let Some(key) = note.image_key.clone() else {
            return NoteCard::without_image(note);
        };

        match self.ctx.storage.get_display_url(&key).await {
            Ok(url) => {
                trace!(note_id = %note.id, image_key = %key, "Resolved display URL");
                NoteCard {
                    note,
                    image_url: Some(url),
                }
            }
            Err(e) => {
                warn!(
                    subsystem = "view",
                    component = "notes_view",
                    note_id = %note.id,
                    image_key = %key,
                    error = %e,
                    "Display URL unavailable; showing note without image"
                );
                NoteCard::without_image(note)
            }
        }
    }

    /// Submit the draft.
    ///
    /// Returns `Ok(None)` without contacting any service when the title is
    /// blank. On failure the draft is kept for a retry and the error is both
    /// returned and shown on the page.
    pub async fn create(&self) -> Result<Option<Note>> {
        let draft = self.draft();
        if !draft.has_title() {
            debug!(subsystem = "view", component = "notes_view", op = "create", "Blank title; nothing to create");
            return Ok(None);
        }
        self.require_user().await?;

        let _busy = CreatingGuard::begin(&self.draft);

        let note = match self.submit(&draft).await {
            Ok(note) => note,
            Err(e) => {
                error!(subsystem = "view", component = "notes_view", op = "create", error = %e, "Creating note failed; draft kept");
                self.set_last_error(Some(e.to_string()));
                self.events.emit(ViewEvent::CreateFailed {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        lock(&self.draft).clear_fields();
        self.set_last_error(None);
        info!(subsystem = "view", component = "notes_view", op = "create", note_id = %note.id, "Created note");
        self.events.emit(ViewEvent::NoteCreated { id: note.id });

        self.list().await?;
        Ok(Some(note))
    }

    /// Upload (if a file is attached), then create the record.
    async fn submit(&self, draft: &NoteDraft) -> Result<Note> {
        let image_key = match &draft.file {
            Some(file) => Some(self.upload_image(file).await?),
            None => None,
        };

        let req = CreateNoteRequest::new(&draft.name, &draft.description, image_key.clone());
        self.ctx.data.create(req).await.map_err(|e| {
            if let Some(key) = &image_key {
                warn!(
                    subsystem = "view",
                    component = "notes_view",
                    op = "create",
                    image_key = %key,
                    "Note record not created; uploaded image is orphaned"
                );
            }
            e
        })
    }

    async fn upload_image(&self, file: &ImageFile) -> Result<String> {
        if let FileVerdict::Blocked { reason } =
            validate_file(&file.file_name, &file.data, self.ctx.max_upload_bytes)
        {
            return Err(Error::InvalidInput(format!("{}: {}", file.file_name, reason)));
        }

        let key = image_key(&file.file_name);
        let content_type =
            resolve_content_type(&file.file_name, &file.data, file.content_type.as_deref());
        debug!(
            subsystem = "view",
            component = "notes_view",
            op = "upload",
            image_key = %key,
            content_type = %content_type,
            size_bytes = file.size(),
            "Uploading image"
        );

        self.ctx
            .storage
            .upload(&key, &file.data, UploadOptions::new(content_type))
            .await?;
        Ok(key)
    }

    /// Delete a note and, best-effort, its image; then reload.
    ///
    /// A note that is already gone counts as deleted. A failed image removal
    /// is logged and leaves the object orphaned.
    pub async fn delete(&self, id: Uuid, image_key: Option<&str>) -> Result<()> {
        self.require_user().await?;

        match self.ctx.data.delete(id).await {
            Ok(()) => {}
            Err(Error::NoteNotFound(_)) => {
                debug!(subsystem = "view", component = "notes_view", op = "delete", note_id = %id, "Note already gone");
            }
            Err(e) => {
                error!(subsystem = "view", component = "notes_view", op = "delete", note_id = %id, error = %e, "Deleting note failed");
                return Err(e);
            }
        }

        if let Some(key) = image_key {
            if let Err(e) = self.ctx.storage.remove(key).await {
                warn!(
                    subsystem = "view",
                    component = "notes_view",
                    op = "delete",
                    note_id = %id,
                    image_key = %key,
                    error = %e,
                    "Storage remove failed (non-fatal)"
                );
            }
        }

        info!(subsystem = "view", component = "notes_view", op = "delete", note_id = %id, "Deleted note");
        self.events.emit(ViewEvent::NoteDeleted { id });
        self.list().await?;
        Ok(())
    }

    /// Delete the note behind a card.
    pub async fn delete_card(&self, card: &NoteCard) -> Result<()> {
        self.delete(card.note.id, card.note.image_key.as_deref()).await
    }
}
