//! File-based Error Log Store
//!
//! Keeps the whole log as one JSON array file, in the same format the export
//! produces. Appends are read-modify-write, serialized by an async mutex and
//! written through a temporary file that is renamed over the log.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::wizard::ErrorLogEntry;
use crate::ports::{ErrorLogError, ErrorLogStore};

/// File-backed append-only error log.
#[derive(Debug)]
pub struct FileErrorLogStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileErrorLogStore {
    /// Create a store backed by the given file.
    ///
    /// The file and its parent directory are created on first append.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileErrorLogStore::new("./eep_errors.json");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn load(&self) -> Result<Vec<ErrorLogEntry>, ErrorLogError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ErrorLogError::Unavailable(e.to_string())),
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&text).map_err(|e| {
            ErrorLogError::Corrupted(format!("{}: {}", self.path.display(), e))
        })
    }

    async fn store(&self, entries: &[ErrorLogEntry]) -> Result<(), ErrorLogError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        let temp = self.temp_path();
        fs::write(&temp, json).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ErrorLogStore for FileErrorLogStore {
    async fn append(&self, entry: ErrorLogEntry) -> Result<(), ErrorLogError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await?;
        entries.push(entry);
        self.store(&entries).await?;

        tracing::info!(
            path = %self.path.display(),
            entries = entries.len(),
            "error log entry appended"
        );
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ErrorLogEntry>, ErrorLogError> {
        let _guard = self.write_lock.lock().await;
        self.load().await
    }
}
