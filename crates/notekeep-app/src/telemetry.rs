//! Tracing subscriber setup.

use std::path::Path;

use anyhow::Context;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use notekeep_core::defaults;

use crate::config::{LogConfig, LogFormat};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. When a log file
/// is configured, output goes to a daily-rotated file through a non-blocking
/// writer; keep the returned guard alive until shutdown so buffered lines
/// are flushed.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let fallback = config.filter.as_deref().unwrap_or(defaults::LOG_FILTER);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(path) = &config.file {
        let file_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(defaults::LOG_FILE_NAME);
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        match config.format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .try_init(),
            LogFormat::Text => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(config.ansi.unwrap_or(false)),
                )
                .try_init(),
        }
        .context("installing file tracing subscriber")?;
        Some(guard)
    } else {
        match config.format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init(),
            LogFormat::Text => {
                let mut layer = tracing_subscriber::fmt::layer();
                if let Some(ansi) = config.ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).try_init()
            }
        }
        .context("installing console tracing subscriber")?;
        None
    };

    info!(
        log_format = %config.format,
        log_file = %config
            .file
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(stdout)".to_string()),
        "Logging initialized"
    );
    Ok(guard)
}
