//! Centralized default constants for notekeep.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// STORAGE
// =============================================================================

/// Key prefix under which note images are stored.
pub const IMAGE_KEY_PREFIX: &str = "images/";

/// Content type used when an upload's type is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Maximum accepted upload size in bytes (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Lifetime of a display URL in seconds (15 minutes).
pub const DISPLAY_URL_TTL_SECS: u64 = 900;

/// Longest display URL lifetime a configuration may ask for (7 days).
pub const MAX_DISPLAY_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Base URL display URLs are issued under.
pub const PUBLIC_BASE_URL: &str = "http://localhost:3000/files";

/// Context string for deriving the display URL signing key.
pub const URL_SIGNING_CONTEXT: &str = "notekeep 2026-10 display-url signing";

// =============================================================================
// DATABASE
// =============================================================================

/// Default maximum number of connections in the pool.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Default minimum number of idle connections kept open.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Default connection timeout in seconds.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout in seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// VIEW
// =============================================================================

/// View event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 64;

/// Submit button label while idle.
pub const SUBMIT_LABEL: &str = "Create note";

/// Submit button label while a create is in flight.
pub const SUBMIT_LABEL_BUSY: &str = "Creating…";

// =============================================================================
// LOGGING
// =============================================================================

/// Default `RUST_LOG` filter when none is set.
pub const LOG_FILTER: &str = "notekeep_app=info,notekeep_db=info,notekeep_core=info";

/// Default log file name when `LOG_FILE` names only a directory.
pub const LOG_FILE_NAME: &str = "notekeep.log";
