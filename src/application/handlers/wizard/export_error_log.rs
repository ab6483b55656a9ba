//! ExportErrorLog - Query handler producing the downloadable error log.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::wizard::ErrorLogExport;
use crate::ports::{ErrorLogError, ErrorLogStore};

/// Handler for exporting the error log.
pub struct ExportErrorLogHandler {
    store: Arc<dyn ErrorLogStore>,
}

impl ExportErrorLogHandler {
    pub fn new(store: Arc<dyn ErrorLogStore>) -> Self {
        Self { store }
    }

    /// Returns the whole log as one JSON array, or `None` when it is empty.
    pub async fn handle(&self) -> Result<Option<ErrorLogExport>, ErrorLogError> {
        self.handle_at(&Timestamp::now()).await
    }

    /// Same as [`handle`](Self::handle) with an explicit export time.
    pub async fn handle_at(
        &self,
        exported_at: &Timestamp,
    ) -> Result<Option<ErrorLogExport>, ErrorLogError> {
        let entries = self.store.read_all().await?;
        let export = ErrorLogExport::from_entries(&entries, exported_at)?;

        match &export {
            Some(export) => tracing::info!(
                entries = export.entry_count,
                file_name = %export.file_name,
                "error log exported"
            ),
            None => tracing::info!("error log empty, nothing to export"),
        }
        Ok(export)
    }
}
