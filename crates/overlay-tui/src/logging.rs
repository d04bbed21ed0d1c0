use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub const LOG_FILE: &str = "overlay.log";

/// Route `tracing` output to a file in `log_dir`; the terminal belongs to the
/// UI. Keep the returned guard alive until exit or buffered lines are lost.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        log_file_opts.mode(0o600);
    }

    let log_file = log_file_opts.open(log_dir.join(LOG_FILE))?;
    let (non_blocking, guard) = non_blocking(log_file);

    // use RUST_LOG env var, default to info for overlay crates.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("overlay_core=info,overlay_tui=info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_ansi(false)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(file_layer).try_init();

    Ok(guard)
}

/// Like [`init`], but a logger that cannot be set up is reported on stderr
/// and the program carries on without one. Call before the terminal switches
/// to the alternate screen.
pub fn init_or_warn(log_dir: Result<PathBuf>) -> Option<WorkerGuard> {
    match log_dir.and_then(|dir| init(&dir)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("overlay: logging disabled: {e:#}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        let guard = init(&log_dir).unwrap();
        tracing::info!("hello");
        drop(guard);

        assert!(log_dir.join(LOG_FILE).exists());
    }

    #[test]
    fn test_unwritable_log_dir_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        assert!(init_or_warn(Ok(blocker.join("logs"))).is_none());
        assert!(init_or_warn(Err(anyhow::anyhow!("no config dir"))).is_none());
    }
}
