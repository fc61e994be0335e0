//! Mock collaborators for deterministic testing.
//!
//! Wrap the in-memory backends with a call log and switchable failures.
//!
//! ## Usage
//!
//! ```rust
//! use notekeep_db::mock::{MockDataService, MockStorageService};
//!
//! # async fn demo() {
//! let data = MockDataService::new();
//! data.set_fail_create(true);
//!
//! let storage = MockStorageService::new().with_failing_url("images/broken.png");
//! # }
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use notekeep_core::{
    CreateNoteRequest, DataService, Error, ListNotesResponse, Note, Result, ServiceError,
    StorageService, UploadOptions,
};

use crate::file_storage::{MemoryStorage, StoredObject};
use crate::memory::MemoryNoteRepository;
use crate::url_signing::UrlSigner;

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: &'static str,
    pub input: String,
}

#[derive(Default)]
struct CallLog(Mutex<Vec<MockCall>>);

impl CallLog {
    fn push(&self, operation: &'static str, input: impl Into<String>) {
        self.0.lock().unwrap().push(MockCall {
            operation,
            input: input.into(),
        });
    }

    fn snapshot(&self) -> Vec<MockCall> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, operation: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }
}

fn injected(what: &str) -> Error {
    Error::Internal(format!("injected {} failure", what))
}

// =============================================================================
// DATA SERVICE
// =============================================================================

#[derive(Default)]
struct DataFailures {
    list: AtomicBool,
    create: AtomicBool,
    delete: AtomicBool,
    list_errors: Mutex<Vec<ServiceError>>,
    list_latency_ms: AtomicU64,
}

/// Mock [`DataService`] backed by [`MemoryNoteRepository`].
#[derive(Clone, Default)]
pub struct MockDataService {
    inner: Arc<MemoryNoteRepository>,
    failures: Arc<DataFailures>,
    calls: Arc<CallLog>,
}

impl MockDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these per-item errors from every `list` call.
    pub fn with_list_errors(self, errors: Vec<ServiceError>) -> Self {
        self.set_list_errors(errors);
        self
    }

    /// Delay every `list` call.
    pub fn with_list_latency_ms(self, latency_ms: u64) -> Self {
        self.failures
            .list_latency_ms
            .store(latency_ms, Ordering::SeqCst);
        self
    }

    pub fn set_list_errors(&self, errors: Vec<ServiceError>) {
        *self.failures.list_errors.lock().unwrap() = errors;
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.failures.list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.failures.create.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.failures.delete.store(fail, Ordering::SeqCst);
    }

    /// Insert a note directly into the backing store.
    pub async fn seed(&self, note: Note) {
        self.inner.seed(note).await;
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.snapshot()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls.count(operation)
    }
}

#[async_trait]
impl DataService for MockDataService {
    async fn list(&self) -> Result<ListNotesResponse> {
        self.calls.push("list", "");
        let latency = self.failures.list_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.failures.list.load(Ordering::SeqCst) {
            return Err(injected("list"));
        }
        let mut response = self.inner.list().await?;
        response.errors = self.failures.list_errors.lock().unwrap().clone();
        Ok(response)
    }

    async fn create(&self, req: CreateNoteRequest) -> Result<Note> {
        self.calls.push("create", req.name.clone());
        if self.failures.create.load(Ordering::SeqCst) {
            return Err(injected("create"));
        }
        self.inner.create(req).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.calls.push("delete", id.to_string());
        if self.failures.delete.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }
        self.inner.delete(id).await
    }
}

// =============================================================================
// STORAGE SERVICE
// =============================================================================

#[derive(Default)]
struct StorageFailures {
    upload: AtomicBool,
    remove: AtomicBool,
    url_keys: Mutex<HashSet<String>>,
    url_latency_ms: AtomicU64,
}

/// Mock [`StorageService`] backed by [`MemoryStorage`].
#[derive(Clone)]
pub struct MockStorageService {
    inner: Arc<MemoryStorage>,
    signer: UrlSigner,
    failures: Arc<StorageFailures>,
    calls: Arc<CallLog>,
}

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorageService {
    pub fn new() -> Self {
        let signer = UrlSigner::new(
            "mock-storage",
            "http://mock.storage/files",
            chrono::Duration::seconds(900),
        );
        Self {
            inner: Arc::new(MemoryStorage::new(signer.clone())),
            signer,
            failures: Arc::new(StorageFailures::default()),
            calls: Arc::new(CallLog::default()),
        }
    }

    /// Make `get_display_url` fail for `key` even if the object exists.
    pub fn with_failing_url(self, key: impl Into<String>) -> Self {
        self.failures.url_keys.lock().unwrap().insert(key.into());
        self
    }

    /// Delay every `get_display_url` call.
    pub fn with_url_latency_ms(self, latency_ms: u64) -> Self {
        self.failures
            .url_latency_ms
            .store(latency_ms, Ordering::SeqCst);
        self
    }

    pub fn set_fail_upload(&self, fail: bool) {
        self.failures.upload.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.failures.remove.store(fail, Ordering::SeqCst);
    }

    /// The signer URLs from this mock verify against.
    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.contains(key).await
    }

    pub async fn fetch(&self, key: &str) -> Result<StoredObject> {
        self.inner.fetch(key).await
    }

    pub async fn object_count(&self) -> usize {
        self.inner.len().await
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.snapshot()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls.count(operation)
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload(&self, key: &str, data: &[u8], options: UploadOptions) -> Result<()> {
        self.calls.push("upload", key);
        if self.failures.upload.load(Ordering::SeqCst) {
            return Err(injected("upload"));
        }
        self.inner.upload(key, data, options).await
    }

    async fn get_display_url(&self, key: &str) -> Result<String> {
        self.calls.push("get_display_url", key);
        let latency = self.failures.url_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.failures.url_keys.lock().unwrap().contains(key) {
            return Err(Error::Storage(format!("access denied for {}", key)));
        }
        self.inner.get_display_url(key).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.calls.push("remove", key);
        if self.failures.remove.load(Ordering::SeqCst) {
            return Err(injected("remove"));
        }
        self.inner.remove(key).await
    }
}
