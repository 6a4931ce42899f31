//! Log output setup
//!
//! The terminal belongs to the dashboard, so logs go to a file: either the one
//! given on the command line or `hostpilot.log` in the XDG cache directory
//! (`~/.cache/hostpilot/` on Linux).

use directories::ProjectDirs;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// File name used inside the cache directory
const LOG_FILE_NAME: &str = "hostpilot.log";

/// Default log file location, if a home directory can be determined
pub fn default_log_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "hostpilot")?;
    Some(project_dirs.cache_dir().join(LOG_FILE_NAME))
}

/// Opens `path` for appending, creating parent directories as needed
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global tracing subscriber
///
/// # Returns
/// * `Ok(Some(path))` with the file logs are written to
/// * `Ok(None)` if no log location could be determined; logs are discarded
/// * `Err` if the file could not be opened or a subscriber is already set
pub fn init(log_file: Option<&Path>, filter: &str) -> io::Result<Option<PathBuf>> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let path = log_file.map(Path::to_path_buf).or_else(default_log_path);
    let Some(path) = path else {
        return Ok(None);
    };

    let file = open_log_file(&path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(Some(path))
}
