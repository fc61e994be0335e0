//! # notekeep-db
//!
//! Backends for the notekeep collaborator traits.
//!
//! This crate provides:
//! - PostgreSQL connection pool management and note repository
//! - An in-memory note repository
//! - Filesystem and in-memory image storage with signed display URLs
//! - An in-process identity provider
//! - Mock collaborators for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use notekeep_db::{Database, DataService, CreateNoteRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/notekeep").await?;
//!
//!     let note = db.notes.create(CreateNoteRequest::new("Groceries", "", None)).await?;
//!     println!("Created note: {}", note.id);
//!     Ok(())
//! }
//! ```

pub mod file_storage;
pub mod identity;
pub mod memory;
pub mod mock;
pub mod notes;
pub mod pool;
pub mod url_signing;

// Re-export core types
pub use notekeep_core::*;

pub use file_storage::{FilesystemStorage, MemoryStorage, ObjectMeta, StoredObject};
pub use identity::SessionIdentityProvider;
pub use memory::MemoryNoteRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use url_signing::{UrlSigner, UrlVerifyError};

/// PostgreSQL-backed data context.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository.
    pub notes: PgNoteRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
