//! Behavior tests for NotesView against the mock collaborators.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use notekeep_app::{NotesContext, NotesView, RefreshOutcome, Screen, ViewEvent};
use notekeep_core::defaults::{SUBMIT_LABEL, SUBMIT_LABEL_BUSY};
use notekeep_core::{
    Error, IdentityProvider, ImageFile, Note, NoteCard, ServiceError, StorageService, UploadOptions,
};
use notekeep_db::mock::{MockDataService, MockStorageService};
use notekeep_db::{MemoryStorage, SessionIdentityProvider, UrlSigner};

const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

struct Harness {
    view: Arc<NotesView>,
    data: MockDataService,
    storage: MockStorageService,
    identity: Arc<SessionIdentityProvider>,
}

fn harness_with(data: MockDataService, storage: MockStorageService) -> Harness {
    let identity = Arc::new(SessionIdentityProvider::signed_in("alice"));
    let ctx = NotesContext::new(
        identity.clone(),
        Arc::new(data.clone()),
        Arc::new(storage.clone()),
    );
    Harness {
        view: Arc::new(NotesView::new(ctx)),
        data,
        storage,
        identity,
    }
}

fn harness() -> Harness {
    harness_with(MockDataService::new(), MockStorageService::new())
}

fn note(name: &str, created_at: Option<(i32, u32, u32)>, image_key: Option<&str>) -> Note {
    Note {
        id: Uuid::now_v7(),
        name: name.to_string(),
        description: String::new(),
        image_key: image_key.map(str::to_string),
        created_at: created_at.map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()),
    }
}

fn names(cards: &[NoteCard]) -> Vec<String> {
    cards.iter().map(|c| c.note.name.clone()).collect()
}

// =============================================================================
// CREATE
// =============================================================================

#[tokio::test]
async fn test_create_without_file() {
    let h = harness();
    h.view.set_name("Groceries");
    h.view.set_description("milk, eggs");

    let created = h.view.create().await.unwrap().expect("note created");
    assert_eq!(created.name, "Groceries");
    assert_eq!(created.description, "milk, eggs");
    assert!(created.image_key.is_none());

    assert_eq!(h.storage.call_count("upload"), 0);
    assert_eq!(h.data.call_count("create"), 1);

    let notes = h.view.notes().await;
    assert_eq!(names(&notes), vec!["Groceries"]);
    assert!(notes[0].image_url.is_none());

    let draft = h.view.draft();
    assert_eq!(draft.name, "");
    assert_eq!(draft.description, "");
    assert!(!draft.creating);
    assert!(h.view.last_error().is_none());
}

#[tokio::test]
async fn test_create_title_only_has_no_description_key_or_url() {
    let h = harness();
    h.view.set_name("Groceries");

    let created = h.view.create().await.unwrap().unwrap();
    assert_eq!(created.description, "");
    assert!(created.image_key.is_none());

    let notes = h.view.notes().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].note.name, "Groceries");
    assert_eq!(notes[0].note.description, "");
    assert!(notes[0].note.image_key.is_none());
    assert!(notes[0].image_url.is_none());
    assert_eq!(h.storage.call_count("get_display_url"), 0);
}

#[tokio::test]
async fn test_create_with_image_uploads_then_shows_signed_url() {
    let h = harness();
    h.view.set_name("Trip");
    h.view.attach_file(ImageFile::new("beach.jpg", JPEG_BYTES.to_vec()));

    let created = h.view.create().await.unwrap().unwrap();
    let key = created.image_key.clone().expect("image key recorded");
    assert!(key.starts_with("images/"));
    assert!(key.ends_with("_beach.jpg"));

    let stored = h.storage.fetch(&key).await.unwrap();
    assert_eq!(stored.data, JPEG_BYTES);
    assert_eq!(stored.meta.content_type, "image/jpeg");

    let calls: Vec<_> = h
        .storage
        .get_calls()
        .into_iter()
        .map(|c| c.operation)
        .collect();
    assert_eq!(calls, vec!["upload", "get_display_url"]);

    let notes = h.view.notes().await;
    assert_eq!(notes.len(), 1);
    let url = notes[0].image_url.as_deref().expect("display url");
    assert_eq!(h.storage.signer().verify(url, Utc::now()).unwrap(), key);
    assert!(h.view.draft().file.is_none());
}

#[tokio::test]
async fn test_create_trims_fields() {
    let h = harness();
    h.view.set_name("  Groceries  ");
    h.view.set_description("  milk  ");

    let created = h.view.create().await.unwrap().unwrap();
    assert_eq!(created.name, "Groceries");
    assert_eq!(created.description, "milk");
}

#[tokio::test]
async fn test_create_blank_title_is_noop() {
    let h = harness();
    h.view.set_name("   ");
    h.view.attach_file(ImageFile::new("beach.jpg", JPEG_BYTES.to_vec()));

    assert!(h.view.create().await.unwrap().is_none());
    assert!(h.data.get_calls().is_empty());
    assert!(h.storage.get_calls().is_empty());
    assert!(h.view.draft().file.is_some());
}

#[tokio::test]
async fn test_create_failure_keeps_draft_and_reports() {
    let h = harness();
    h.data.set_fail_create(true);
    let mut events = h.view.subscribe();

    h.view.set_name("Trip");
    h.view.set_description("beach day");
    h.view.attach_file(ImageFile::new("beach.jpg", JPEG_BYTES.to_vec()));

    let err = h.view.create().await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));

    let draft = h.view.draft();
    assert_eq!(draft.name, "Trip");
    assert_eq!(draft.description, "beach day");
    assert!(draft.file.is_some());
    assert!(!draft.creating);

    // The upload went through before the record failed; the object is orphaned.
    assert_eq!(h.storage.object_count().await, 1);
    assert!(h.view.notes().await.is_empty());
    assert_eq!(h.data.call_count("list"), 0);

    let banner = h.view.last_error().expect("error shown");
    assert!(banner.contains("injected create failure"));
    assert!(matches!(
        events.try_recv().unwrap(),
        ViewEvent::CreateFailed { .. }
    ));
}

#[tokio::test]
async fn test_upload_failure_skips_record() {
    let h = harness();
    h.storage.set_fail_upload(true);
    h.view.set_name("Trip");
    h.view.attach_file(ImageFile::new("beach.jpg", JPEG_BYTES.to_vec()));

    assert!(h.view.create().await.is_err());
    assert_eq!(h.data.call_count("create"), 0);
    assert_eq!(h.view.draft().name, "Trip");
}

#[tokio::test]
async fn test_create_rejects_executable_upload() {
    let h = harness();
    h.view.set_name("Totally a photo");
    h.view
        .attach_file(ImageFile::new("holiday.exe", vec![0x4D, 0x5A, 0x90, 0x00]));

    let err = h.view.create().await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(h.storage.call_count("upload"), 0);
    assert_eq!(h.data.call_count("create"), 0);
    assert!(h.view.last_error().is_some());
}

#[tokio::test]
async fn test_create_rejects_oversized_upload() {
    let data = MockDataService::new();
    let storage = MockStorageService::new();
    let identity = Arc::new(SessionIdentityProvider::signed_in("alice"));
    let ctx = NotesContext::new(identity, Arc::new(data.clone()), Arc::new(storage.clone()))
        .with_max_upload_bytes(4);
    let view = NotesView::new(ctx);

    view.set_name("Trip");
    view.attach_file(ImageFile::new("beach.jpg", JPEG_BYTES.to_vec()));

    assert!(matches!(
        view.create().await.unwrap_err(),
        Error::InvalidInput(_)
    ));
    assert_eq!(storage.call_count("upload"), 0);
}

#[tokio::test]
async fn test_success_clears_previous_error() {
    let h = harness();
    h.data.set_fail_create(true);
    h.view.set_name("Groceries");
    assert!(h.view.create().await.is_err());
    assert!(h.view.last_error().is_some());

    h.data.set_fail_create(false);
    assert!(h.view.create().await.unwrap().is_some());
    assert!(h.view.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_submit_disabled_while_creating() {
    let data = MockDataService::new().with_list_latency_ms(100);
    let h = harness_with(data, MockStorageService::new());
    h.view.set_name("Groceries");

    let view = h.view.clone();
    let task = tokio::spawn(async move { view.create().await });
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    match h.view.render().await.unwrap() {
        Screen::Notes(page) => {
            assert!(!page.submit_enabled);
            assert_eq!(page.submit_label, SUBMIT_LABEL_BUSY);
        }
        Screen::SignIn => panic!("expected notes page"),
    }

    assert!(task.await.unwrap().unwrap().is_some());
    match h.view.render().await.unwrap() {
        Screen::Notes(page) => {
            assert!(page.submit_enabled);
            assert_eq!(page.submit_label, SUBMIT_LABEL);
            assert_eq!(page.notes.len(), 1);
        }
        Screen::SignIn => panic!("expected notes page"),
    }
}

// =============================================================================
// LIST
// =============================================================================

#[tokio::test]
async fn test_list_sorts_newest_first_undated_last() {
    let h = harness();
    h.data.seed(note("A", Some((2024, 1, 1)), None)).await;
    h.data.seed(note("C", None, None)).await;
    h.data.seed(note("B", Some((2024, 3, 5)), None)).await;

    let outcome = h.view.list().await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Refreshed { count: 3 });
    assert_eq!(names(&h.view.notes().await), vec!["B", "A", "C"]);
}

#[tokio::test]
async fn test_list_without_image_skips_storage() {
    let h = harness();
    h.data.seed(note("Plain", Some((2024, 1, 1)), None)).await;

    h.view.list().await.unwrap();
    assert_eq!(h.storage.call_count("get_display_url"), 0);
    assert!(h.view.notes().await[0].image_url.is_none());
}

#[tokio::test]
async fn test_failing_url_only_drops_that_image() {
    let storage = MockStorageService::new().with_failing_url("images/broken.png");
    let h = harness_with(MockDataService::new(), storage);

    for key in ["images/ok.png", "images/broken.png"] {
        h.storage
            .upload(key, PNG_BYTES, UploadOptions::new("image/png"))
            .await
            .unwrap();
    }
    h.data
        .seed(note("Fine", Some((2024, 2, 1)), Some("images/ok.png")))
        .await;
    h.data
        .seed(note("Broken", Some((2024, 1, 1)), Some("images/broken.png")))
        .await;

    assert_eq!(
        h.view.list().await.unwrap(),
        RefreshOutcome::Refreshed { count: 2 }
    );
    let notes = h.view.notes().await;
    assert_eq!(names(&notes), vec!["Fine", "Broken"]);
    assert!(notes[0].image_url.is_some());
    assert!(notes[1].image_url.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_display_urls_resolve_concurrently() {
    let storage = MockStorageService::new().with_url_latency_ms(100);
    let h = harness_with(MockDataService::new(), storage);

    for (i, key) in ["images/a.png", "images/b.png", "images/c.png"].iter().enumerate() {
        h.storage
            .upload(key, PNG_BYTES, UploadOptions::new("image/png"))
            .await
            .unwrap();
        h.data
            .seed(note(&format!("N{}", i), Some((2024, 1, i as u32 + 1)), Some(key)))
            .await;
    }

    let start = tokio::time::Instant::now();
    h.view.list().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(h.storage.call_count("get_display_url"), 3);
    assert!(
        elapsed < std::time::Duration::from_millis(200),
        "lookups ran one after another: {:?}",
        elapsed
    );
    assert!(h.view.notes().await.iter().all(|c| c.image_url.is_some()));
}

#[tokio::test]
async fn test_unsignable_url_only_drops_that_image() {
    let data = MockDataService::new();
    let signer = UrlSigner::new(
        "a-long-enough-secret",
        "http://localhost/files",
        chrono::Duration::days(365 * 1_000_000),
    );
    let storage = Arc::new(MemoryStorage::new(signer));
    let identity = Arc::new(SessionIdentityProvider::signed_in("alice"));
    let view = NotesView::new(NotesContext::new(
        identity,
        Arc::new(data.clone()),
        storage.clone(),
    ));

    view.set_name("Trip");
    view.attach_file(ImageFile::new("beach.jpg", JPEG_BYTES.to_vec()));
    let created = view.create().await.unwrap().expect("note created");

    let notes = view.notes().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].note.id, created.id);
    assert!(notes[0].image_url.is_none());
    assert!(storage.contains(created.image_key.as_deref().unwrap()).await);
}

#[tokio::test]
async fn test_partial_errors_keep_previous_snapshot() {
    let h = harness();
    h.data.seed(note("First", Some((2024, 1, 1)), None)).await;
    h.view.list().await.unwrap();

    h.data.seed(note("Second", Some((2024, 2, 1)), None)).await;
    h.data
        .set_list_errors(vec![ServiceError::new("bad row").with_path("note/123")]);
    let mut events = h.view.subscribe();

    match h.view.list().await.unwrap() {
        RefreshOutcome::Aborted { errors } => assert_eq!(errors.len(), 1),
        other => panic!("expected abort, got {:?}", other),
    }
    assert_eq!(names(&h.view.notes().await), vec!["First"]);
    assert_eq!(
        events.try_recv().unwrap(),
        ViewEvent::RefreshAborted {
            errors: vec!["bad row (note/123)".to_string()]
        }
    );
}

#[tokio::test]
async fn test_list_failure_propagates_and_keeps_snapshot() {
    let h = harness();
    h.data.seed(note("First", Some((2024, 1, 1)), None)).await;
    h.view.list().await.unwrap();

    h.data.set_fail_list(true);
    assert!(h.view.list().await.is_err());
    assert_eq!(names(&h.view.notes().await), vec!["First"]);
}

// =============================================================================
// DELETE
// =============================================================================

#[tokio::test]
async fn test_delete_removes_note_and_image() {
    let h = harness();
    h.view.set_name("Trip");
    h.view.attach_file(ImageFile::new("beach.jpg", JPEG_BYTES.to_vec()));
    let created = h.view.create().await.unwrap().unwrap();

    let card = h.view.notes().await.remove(0);
    h.view.delete_card(&card).await.unwrap();

    assert!(h.view.notes().await.is_empty());
    assert_eq!(h.storage.object_count().await, 0);
    assert_eq!(h.storage.call_count("remove"), 1);
    assert_eq!(h.data.call_count("delete"), 1);
    assert!(!h
        .storage
        .contains(created.image_key.as_deref().unwrap())
        .await);
}

#[tokio::test]
async fn test_delete_tolerates_missing_image() {
    let h = harness();
    let gone = note("Old", Some((2024, 1, 1)), Some("images/gone.png"));
    let id = gone.id;
    h.data.seed(gone).await;
    h.view.list().await.unwrap();

    h.view.delete(id, Some("images/gone.png")).await.unwrap();
    assert_eq!(h.storage.call_count("remove"), 1);
    assert!(h.view.notes().await.is_empty());
}

#[tokio::test]
async fn test_delete_without_image_skips_storage() {
    let h = harness();
    let plain = note("Plain", Some((2024, 1, 1)), None);
    let id = plain.id;
    h.data.seed(plain).await;

    h.view.delete(id, None).await.unwrap();
    assert_eq!(h.storage.call_count("remove"), 0);
}

#[tokio::test]
async fn test_delete_already_gone_note_still_refreshes() {
    let h = harness();
    let mut events = h.view.subscribe();

    h.view.delete(Uuid::now_v7(), None).await.unwrap();
    assert_eq!(h.data.call_count("list"), 1);
    assert!(matches!(
        events.try_recv().unwrap(),
        ViewEvent::NoteDeleted { .. }
    ));
}

#[tokio::test]
async fn test_delete_failure_leaves_image_alone() {
    let h = harness();
    h.storage
        .upload("images/keep.png", PNG_BYTES, UploadOptions::new("image/png"))
        .await
        .unwrap();
    let kept = note("Keep", Some((2024, 1, 1)), Some("images/keep.png"));
    let id = kept.id;
    h.data.seed(kept).await;
    h.data.set_fail_delete(true);

    assert!(h.view.delete(id, Some("images/keep.png")).await.is_err());
    assert_eq!(h.storage.call_count("remove"), 0);
    assert!(h.storage.contains("images/keep.png").await);
}

// =============================================================================
// SESSION
// =============================================================================

#[tokio::test]
async fn test_signed_out_shows_gate_and_touches_nothing() {
    let data = MockDataService::new();
    let storage = MockStorageService::new();
    let identity = Arc::new(SessionIdentityProvider::signed_out());
    let view = NotesView::new(NotesContext::new(
        identity.clone(),
        Arc::new(data.clone()),
        Arc::new(storage.clone()),
    ));

    assert_eq!(view.render().await.unwrap(), Screen::SignIn);
    assert!(view.mount().await.unwrap().is_none());

    view.set_name("Groceries");
    assert!(matches!(view.list().await, Err(Error::Unauthorized(_))));
    assert!(matches!(view.create().await, Err(Error::Unauthorized(_))));
    assert!(matches!(
        view.delete(Uuid::now_v7(), None).await,
        Err(Error::Unauthorized(_))
    ));
    assert!(data.get_calls().is_empty());
    assert!(storage.get_calls().is_empty());

    identity.sign_in("bob").await.unwrap();
    assert_eq!(
        view.mount().await.unwrap(),
        Some(RefreshOutcome::Refreshed { count: 0 })
    );
    match view.render().await.unwrap() {
        Screen::Notes(page) => assert_eq!(page.greeting(), "Signed in as bob"),
        Screen::SignIn => panic!("expected notes page"),
    }
}

#[tokio::test]
async fn test_sign_out_clears_view_state() {
    let h = harness();
    h.view.set_name("Groceries");
    h.view.create().await.unwrap();
    h.view.set_name("Half typed");
    let mut events = h.view.subscribe();

    h.view.sign_out().await.unwrap();

    assert_eq!(h.view.render().await.unwrap(), Screen::SignIn);
    assert!(h.view.notes().await.is_empty());
    assert_eq!(h.view.draft().name, "");
    assert!(h.identity.current_user().await.unwrap().is_none());
    assert_eq!(events.try_recv().unwrap(), ViewEvent::SignedOut);
}

// =============================================================================
// EVENTS
// =============================================================================

#[tokio::test]
async fn test_create_emits_created_then_refreshed() {
    let h = harness();
    let mut events = h.view.subscribe();
    h.view.set_name("Groceries");
    let created = h.view.create().await.unwrap().unwrap();

    assert_eq!(
        events.try_recv().unwrap(),
        ViewEvent::NoteCreated { id: created.id }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        ViewEvent::NotesRefreshed { count: 1 }
    );
}
