use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::APP_NAME;
use crate::paths::ProjectPaths;

const MAX_LOG_SIZE: u64 = 1024 * 1024; // 1MB

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging for a component
///
/// With `file_enabled`, logs also go to `<data dir>/logs/<component>.log`
/// through a non-blocking writer. The returned guard flushes that writer on
/// drop, so keep it alive until the program exits.
pub fn init_logging(component: &str, file_enabled: bool) -> io::Result<Option<WorkerGuard>> {
    if !file_enabled {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
        return Ok(None);
    }

    let log_dir = ProjectPaths::new(APP_NAME)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Failed to find home directory"))?
        .log_dir();
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join(format!("{}.log", component));
    truncate_if_needed(&log_path)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let (non_blocking_file, guard) = tracing_appender::non_blocking(BufWriter::new(file));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(io::stdout).with_ansi(true))
        .with(
            fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    tracing::info!(target: "host", "Logging to file: {}", log_path.display());
    Ok(Some(guard))
}

/// Start the log over once it grows past `MAX_LOG_SIZE`
fn truncate_if_needed(log_path: &Path) -> io::Result<()> {
    match fs::metadata(log_path) {
        Ok(metadata) if metadata.len() > MAX_LOG_SIZE => {
            File::create(log_path)?;
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
