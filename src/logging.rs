//! File logging. A TUI owns the terminal, so log lines go to
//! `<state dir>/bukvar.log` instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::Result;

pub const LOG_ENV: &str = "BUKVAR_LOG";
const DEFAULT_FILTER: &str = "bukvar=info";

/// `BUKVAR_LOG` wins over the built-in `bukvar=info`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber appending to `path`. Safe to call twice;
/// the second call leaves the first subscriber in place.
pub fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
    Ok(())
}
