use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use chrono::{Local, NaiveDateTime, Timelike};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolves capture destinations under `<root>/<folder>`
#[derive(Debug, Clone)]
pub struct CaptureStorage {
    root: PathBuf,
    folder: String,
    file_suffix: String,
}

impl CaptureStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            folder: config.folder.clone(),
            file_suffix: config.file_suffix.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Capture directory, whether or not it exists yet
    pub fn capture_dir(&self) -> PathBuf {
        self.root.join(&self.folder)
    }

    /// Create the capture directory if needed and return its absolute path
    pub fn ensure_capture_dir(&self) -> Result<PathBuf> {
        let dir = self.capture_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| StorageError::DirectoryCreation {
                path: dir.clone(),
                source: e,
            })?;
            info!("Created capture directory: {}", dir.display());
        }

        let absolute = dir
            .canonicalize()
            .map_err(|e| StorageError::DirectoryCreation {
                path: dir.clone(),
                source: e,
            })?;
        Ok(absolute)
    }

    /// File name for a capture taken at `at`
    pub fn file_name_for(&self, at: &NaiveDateTime) -> String {
        format!("{}{}", sql_timestamp(at), self.file_suffix)
    }

    /// Create an empty destination file in `dir` for a capture taken at `at`
    pub fn create_destination(&self, dir: &Path, at: &NaiveDateTime) -> Result<PathBuf> {
        let path = dir.join(self.file_name_for(at));
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| StorageError::FileCreation {
                path: path.clone(),
                source: e,
            })?;

        debug!("Created capture destination {}", path.display());
        Ok(path)
    }

    /// Directory plus empty file for a capture taken now
    pub fn prepare_destination(&self) -> Result<PathBuf> {
        let dir = self.ensure_capture_dir()?;
        self.create_destination(&dir, &Local::now().naive_local())
    }
}

/// Render `at` in SQL timestamp text form: `yyyy-mm-dd hh:mm:ss.f`.
///
/// Fractional seconds keep nanosecond precision with trailing zeros
/// trimmed, but always at least one digit.
pub fn sql_timestamp(at: &NaiveDateTime) -> String {
    let nanos = at.nanosecond() % 1_000_000_000;
    let fraction = if nanos == 0 {
        "0".to_string()
    } else {
        let digits = format!("{:09}", nanos);
        digits.trim_end_matches('0').to_string()
    };

    format!("{}.{}", at.format("%Y-%m-%d %H:%M:%S"), fraction)
}
