//! Storage service backends for note images.
//!
//! - [`FilesystemStorage`]: objects under a base directory with atomic writes
//! - [`MemoryStorage`]: objects in a process-local map
//!
//! Both issue display URLs through a shared [`UrlSigner`].
//!
//! ## Layout
//!
//! ```text
//! {base_path}/objects/{key}        object bytes
//! {base_path}/meta/{key}.json      content type, size, upload time
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use notekeep_core::{validate_key, Error, Result, StorageService, UploadOptions};

use crate::url_signing::{UrlSigner, UrlVerifyError};

/// Metadata recorded alongside each stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// An object read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub meta: ObjectMeta,
    pub data: Vec<u8>,
}

fn url_error(e: UrlVerifyError) -> Error {
    Error::Unauthorized(format!("display URL rejected: {}", e))
}

// =============================================================================
// FILESYSTEM
// =============================================================================

/// Filesystem-backed [`StorageService`].
pub struct FilesystemStorage {
    base_path: PathBuf,
    signer: UrlSigner,
}

impl FilesystemStorage {
    pub fn new(base_path: impl Into<PathBuf>, signer: UrlSigner) -> Self {
        Self {
            base_path: base_path.into(),
            signer,
        }
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.base_path.join("objects").join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.base_path.join("meta").join(format!("{}.json", key))
    }

    /// Validate that the storage directory can write, read, and delete files.
    ///
    /// Run at startup so permission or mount problems surface before the
    /// first upload.
    pub async fn validate(&self) -> Result<()> {
        let probe = self.base_path.join("objects/.health-check/probe.bin");
        let data = b"storage-health-check";

        write_atomic(&probe, data).await?;
        let read_back = fs::read(&probe).await?;
        if read_back != data {
            return Err(Error::Storage(format!(
                "read-back mismatch at {}",
                probe.display()
            )));
        }
        fs::remove_file(&probe).await?;
        if let Some(dir) = probe.parent() {
            let _ = fs::remove_dir(dir).await;
        }
        Ok(())
    }

    /// Read an object and its metadata.
    pub async fn fetch(&self, key: &str) -> Result<StoredObject> {
        validate_key(key)?;
        let data = match fs::read(self.object_path(key)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let meta_bytes = fs::read(self.meta_path(key)).await?;
        let meta: ObjectMeta = serde_json::from_slice(&meta_bytes)?;
        Ok(StoredObject { meta, data })
    }

    /// Resolve a display URL issued by this storage back to its object.
    pub async fn open_display_url(&self, url: &str, now: DateTime<Utc>) -> Result<StoredObject> {
        let key = self.signer.verify(url, now).map_err(url_error)?;
        self.fetch(&key).await
    }
}

/// Atomic write: temp file + rename, then 0644 permissions.
async fn write_atomic(path: &std::path::Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            warn!(parent = %parent.display(), error = %e, "file_storage: create_dir_all failed");
            e
        })?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let mut file = fs::File::create(&temp_path).await.map_err(|e| {
        warn!(temp_path = %temp_path.display(), error = %e, "file_storage: File::create failed");
        e
    })?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await.map_err(|e| {
        warn!(from = %temp_path.display(), to = %path.display(), error = %e, "file_storage: rename failed");
        e
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o644)).await?;
    }

    Ok(())
}

#[async_trait]
impl StorageService for FilesystemStorage {
    async fn upload(&self, key: &str, data: &[u8], options: UploadOptions) -> Result<()> {
        validate_key(key)?;
        debug!(
            subsystem = "storage",
            component = "filesystem",
            op = "upload",
            image_key = %key,
            size_bytes = data.len(),
            "Writing object"
        );

        write_atomic(&self.object_path(key), data).await?;
        let meta = ObjectMeta {
            content_type: options.content_type,
            size_bytes: data.len() as u64,
            uploaded_at: Utc::now(),
        };
        write_atomic(&self.meta_path(key), &serde_json::to_vec(&meta)?).await?;
        Ok(())
    }

    async fn get_display_url(&self, key: &str) -> Result<String> {
        validate_key(key)?;
        if !fs::try_exists(self.object_path(key)).await? {
            return Err(Error::NotFound(key.to_string()));
        }
        self.signer.sign(key, Utc::now())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match fs::remove_file(self.object_path(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        if let Err(e) = fs::remove_file(self.meta_path(key)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(image_key = %key, error = %e, "file_storage: metadata removal failed");
            }
        }
        debug!(subsystem = "storage", component = "filesystem", op = "remove", image_key = %key, "Removed object");
        Ok(())
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Process-local [`StorageService`].
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, StoredObject>>,
    signer: UrlSigner,
}

impl MemoryStorage {
    pub fn new(signer: UrlSigner) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            signer,
        }
    }

    pub async fn fetch(&self, key: &str) -> Result<StoredObject> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn open_display_url(&self, url: &str, now: DateTime<Utc>) -> Result<StoredObject> {
        let key = self.signer.verify(url, now).map_err(url_error)?;
        self.fetch(&key).await
    }
}

#[async_trait]
impl StorageService for MemoryStorage {
    async fn upload(&self, key: &str, data: &[u8], options: UploadOptions) -> Result<()> {
        validate_key(key)?;
        let object = StoredObject {
            meta: ObjectMeta {
                content_type: options.content_type,
                size_bytes: data.len() as u64,
                uploaded_at: Utc::now(),
            },
            data: data.to_vec(),
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn get_display_url(&self, key: &str) -> Result<String> {
        if !self.contains(key).await {
            return Err(Error::NotFound(key.to_string()));
        }
        self.signer.sign(key, Utc::now())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match self.objects.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(key.to_string())),
        }
    }
}
