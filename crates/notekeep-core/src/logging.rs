//! Structured logging field name constants for notekeep.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, sign-out), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (per-note URL resolution) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "view", "db", "storage", "identity", "app"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "notes_view", "pool", "filesystem", "url_signer"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "list", "create", "delete", "upload", "get_display_url"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Storage key of an image object.
pub const IMAGE_KEY: &str = "image_key";

/// Username of the signed-in user.
pub const USERNAME: &str = "username";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of notes returned by a list.
pub const RESULT_COUNT: &str = "result_count";

/// Number of per-item errors reported by a list.
pub const ERROR_COUNT: &str = "error_count";

/// Byte length of an uploaded object.
pub const SIZE_BYTES: &str = "size_bytes";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
