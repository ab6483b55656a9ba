//! In-memory Error Log Store
//!
//! Holds entries in memory. Useful for testing and development.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::wizard::ErrorLogEntry;
use crate::ports::{ErrorLogError, ErrorLogStore};

/// In-memory append-only error log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryErrorLogStore {
    entries: Arc<RwLock<Vec<ErrorLogEntry>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryErrorLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose appends and reads fail as if the backend were down.
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.set_available(false);
        store
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), ErrorLogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(ErrorLogError::unavailable("in-memory store switched off"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ErrorLogStore for InMemoryErrorLogStore {
    async fn append(&self, entry: ErrorLogEntry) -> Result<(), ErrorLogError> {
        self.check_available()?;
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ErrorLogEntry>, ErrorLogError> {
        self.check_available()?;
        Ok(self.entries.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_then_read_preserves_order() {
        let store = InMemoryErrorLogStore::new();
        store.append(ErrorLogEntry::now("a", "e")).await.unwrap();
        store.append(ErrorLogEntry::now("b", "e")).await.unwrap();

        let entries = store.read_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].raw_content(), "a");
        assert_eq!(entries[1].raw_content(), "b");
    }

    #[tokio::test]
    async fn unavailable_store_fails_appends() {
        let store = InMemoryErrorLogStore::unavailable();
        assert!(matches!(
            store.append(ErrorLogEntry::now("a", "e")).await,
            Err(ErrorLogError::Unavailable(_))
        ));

        store.set_available(true);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = InMemoryErrorLogStore::new();
        let handle = store.clone();
        store.append(ErrorLogEntry::now("a", "e")).await.unwrap();
        assert_eq!(handle.len().await, 1);
    }
}
