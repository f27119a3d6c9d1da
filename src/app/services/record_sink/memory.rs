//! In-memory record sink
//!
//! Keeps every appended document for later inspection. Used by the handler
//! tests and by `serve --sink memory` for dry runs where nothing should
//! touch the disk.

use super::{RecordSink, SinkError, validate_collection_name};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// One append observed by the sink
#[derive(Debug, Clone, PartialEq)]
pub struct AppendedRecord {
    pub collection: String,
    pub document: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AppendedRecord>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every append
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    /// Switch the rejection mode on or off
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of every record appended so far
    pub fn records(&self) -> Vec<AppendedRecord> {
        self.lock().clone()
    }

    /// Documents appended to one collection, oldest first
    pub fn documents_in(&self, collection: &str) -> Vec<serde_json::Value> {
        self.lock()
            .iter()
            .filter(|record| record.collection == collection)
            .map(|record| record.document.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AppendedRecord>> {
        // push is the only mutation, so a poisoned Vec is still consistent
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append(
        &self,
        collection: &str,
        document: serde_json::Value,
    ) -> Result<(), SinkError> {
        validate_collection_name(collection)?;

        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::rejected(collection, "memory sink is in failing mode"));
        }

        self.lock().push(AppendedRecord {
            collection: collection.to_string(),
            document,
        });
        debug!("Recorded document in memory collection '{}'", collection);
        Ok(())
    }
}
