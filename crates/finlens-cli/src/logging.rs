//! Tracing setup.
//!
//! The dashboard owns the terminal, so it logs to `finlens.log` in the user
//! data directory. One-shot commands log to stderr. Both honour `RUST_LOG`.
//!
//! Keep the returned `LogGuard` alive until exit so buffered lines flush.

use std::path::PathBuf;

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "finlens.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Stderr,
}

pub struct LogGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn init(target: LogTarget) -> LogGuard {
    match target {
        LogTarget::File => {
            let dir = log_dir();
            let _ = std::fs::create_dir_all(&dir);
            let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let _ = tracing_subscriber::registry()
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .try_init();

            tracing::debug!(path = %dir.join(LOG_FILE).display(), "file logging ready");
            LogGuard {
                _file_guard: Some(guard),
            }
        }
        LogTarget::Stderr => {
            let _ = tracing_subscriber::registry()
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init();

            LogGuard { _file_guard: None }
        }
    }
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(finlens_core::config::APP_DIR))
        .unwrap_or_else(std::env::temp_dir)
}
