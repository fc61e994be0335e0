//! Process-wide collaborator context.

use std::sync::Arc;

use anyhow::Context as _;
use tracing::{info, warn};

use notekeep_core::{DataService, IdentityProvider, StorageService};
use notekeep_db::{
    log_pool_metrics, Database, FilesystemStorage, MemoryNoteRepository, MemoryStorage,
    PgNoteRepository, UrlSigner,
};

use crate::config::AppConfig;

/// The collaborators a [`NotesView`](crate::NotesView) talks to.
///
/// Built once at startup and shared by reference; cloning is cheap.
#[derive(Clone)]
pub struct NotesContext {
    pub identity: Arc<dyn IdentityProvider>,
    pub data: Arc<dyn DataService>,
    pub storage: Arc<dyn StorageService>,
    /// Uploads larger than this are rejected before reaching storage.
    pub max_upload_bytes: u64,
}

impl NotesContext {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        data: Arc<dyn DataService>,
        storage: Arc<dyn StorageService>,
    ) -> Self {
        Self {
            identity,
            data,
            storage,
            max_upload_bytes: notekeep_core::defaults::MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// Build the data and storage backends named by `config`.
    ///
    /// PostgreSQL is used when a database URL is configured (migrations are
    /// applied on connect), otherwise notes live in memory. Likewise images go
    /// to the configured directory or to memory.
    pub async fn from_config(
        config: &AppConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> anyhow::Result<Self> {
        let ttl = i64::try_from(config.storage.url_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .with_context(|| format!("url_ttl_secs {} out of range", config.storage.url_ttl_secs))?;
        let signer = match &config.storage.url_signing_key {
            Some(secret) => UrlSigner::new(secret, &config.storage.public_base_url, ttl),
            None => {
                warn!("URL_SIGNING_KEY not set; display URLs will not survive a restart");
                UrlSigner::ephemeral(&config.storage.public_base_url, ttl)
            }
        };

        let storage: Arc<dyn StorageService> = match &config.storage.path {
            Some(path) => {
                let fs_storage = FilesystemStorage::new(path, signer);
                fs_storage
                    .validate()
                    .await
                    .with_context(|| format!("file storage at {} failed its health check", path.display()))?;
                info!("File storage initialized at {}", path.display());
                Arc::new(fs_storage)
            }
            None => {
                info!("Using in-memory image storage");
                Arc::new(MemoryStorage::new(signer))
            }
        };

        let data: Arc<dyn DataService> = match &config.database.url {
            Some(url) => {
                info!("Connecting to database...");
                let db = Database::connect_with_config(url, config.database.pool_config())
                    .await
                    .context("connecting to database")?;
                info!("Running database migrations...");
                db.migrate().await.context("running migrations")?;
                log_pool_metrics(db.pool());
                Arc::new(PgNoteRepository::new(db.pool.clone()))
            }
            None => {
                info!("Using in-memory note storage");
                Arc::new(MemoryNoteRepository::new())
            }
        };

        Ok(Self::new(identity, data, storage).with_max_upload_bytes(config.storage.max_upload_bytes))
    }
}
