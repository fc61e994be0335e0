//! # notekeep-app
//!
//! The notes view controller plus the startup wiring around it:
//! configuration, tracing setup and the collaborator context.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use notekeep_app::{config::AppConfig, telemetry, NotesContext, NotesView};
//! use notekeep_db::SessionIdentityProvider;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let _guard = telemetry::init_tracing(&config.log)?;
//!
//!     let identity = Arc::new(SessionIdentityProvider::signed_in("alice"));
//!     let view = NotesView::new(NotesContext::from_config(&config, identity).await?);
//!     view.mount().await?;
//!
//!     view.set_name("Groceries");
//!     view.create().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod draft;
pub mod events;
pub mod telemetry;
pub mod view;

pub use config::{AppConfig, ConfigError, LogConfig, LogFormat};
pub use context::NotesContext;
pub use draft::NoteDraft;
pub use events::{EventBus, ViewEvent};
pub use view::{NotesPage, NotesView, RefreshOutcome, Screen};
