//! Best-effort logging setup
//!
//! Structured logs go to stderr and, when the executable's directory is
//! writable, to an append-only file beside it. Logging trouble never
//! takes the viewer down: if the file sink can't be set up we fall back
//! to stderr alone.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber. The returned guard must stay alive
/// for the file sink to flush; `None` means stderr-only.
pub fn init(log_path: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_sink = log_path.parent().and_then(|dir| {
        if !dir.is_dir() {
            return None;
        }
        let file_name = log_path.file_name()?;
        let appender = tracing_appender::rolling::never(dir, file_name);
        Some(tracing_appender::non_blocking(appender))
    });

    match file_sink {
        Some((writer, guard)) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            None
        }
    }
}
