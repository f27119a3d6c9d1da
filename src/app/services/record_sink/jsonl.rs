//! Append-only JSON-lines record sink
//!
//! Each collection maps to `<data_dir>/<collection>.jsonl`. Every append
//! writes one [`StoredDocument`] as a single line and flushes it before
//! reporting success. Appends are serialized through an async mutex so
//! concurrent requests never interleave partial lines.

use super::{RecordSink, SinkError, StoredDocument, validate_collection_name};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug)]
pub struct JsonLinesSink {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    /// Create a sink rooted at `data_dir`; the directory is created lazily
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File backing a collection
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{}.jsonl", collection))
    }

    /// Read back every document stored in a collection
    ///
    /// Not used on the request path; it backs tests and offline inspection.
    pub async fn read_collection(&self, collection: &str) -> Result<Vec<StoredDocument>, SinkError> {
        validate_collection_name(collection)?;

        let path = self.collection_path(collection);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SinkError::io(collection, e)),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| SinkError::serialization(collection, e))
            })
            .collect()
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn append(
        &self,
        collection: &str,
        document: serde_json::Value,
    ) -> Result<(), SinkError> {
        validate_collection_name(collection)?;

        let stored = StoredDocument::new(collection, document);
        let mut line = serde_json::to_vec(&stored)
            .map_err(|e| SinkError::serialization(collection, e))?;
        line.push(b'\n');

        let path = self.collection_path(collection);
        let _guard = self.write_lock.lock().await;

        if !fs::try_exists(&self.data_dir).await.unwrap_or(false) {
            fs::create_dir_all(&self.data_dir)
                .await
                .map_err(|e| SinkError::io(collection, e))?;
            info!("Created sink directory {}", self.data_dir.display());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| SinkError::io(collection, e))?;

        file.write_all(&line)
            .await
            .map_err(|e| SinkError::io(collection, e))?;
        file.flush().await.map_err(|e| SinkError::io(collection, e))?;

        debug!(
            "Appended document {} to {} ({} bytes)",
            stored.id,
            path.display(),
            line.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_creates_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(temp_dir.path().join("nested").join("store"));

        sink.append("iot_data", json!({"device_name": "SensorA"}))
            .await
            .unwrap();

        let path = sink.collection_path("iot_data");
        assert!(path.exists());

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with('\n'));

        let stored = sink.read_collection("iot_data").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].collection, "iot_data");
        assert_eq!(stored[0].data["device_name"], "SensorA");
    }

    #[tokio::test]
    async fn test_collections_are_separate_files() {
        let temp_dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(temp_dir.path());

        sink.append("iot_data", json!({"n": 1})).await.unwrap();
        sink.append("clima_data", json!({"n": 2})).await.unwrap();
        sink.append("iot_data", json!({"n": 3})).await.unwrap();

        let iot = sink.read_collection("iot_data").await.unwrap();
        let clima = sink.read_collection("clima_data").await.unwrap();
        assert_eq!(iot.len(), 2);
        assert_eq!(clima.len(), 1);
        assert_eq!(iot[1].data["n"], 3);
        assert_ne!(iot[0].id, iot[1].id);
    }

    #[tokio::test]
    async fn test_missing_collection_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(temp_dir.path());
        assert!(sink.read_collection("iot_data").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_produce_whole_lines() {
        let temp_dir = TempDir::new().unwrap();
        let sink = Arc::new(JsonLinesSink::new(temp_dir.path()));

        let mut handles = Vec::new();
        for n in 0..32 {
            let sink = Arc::clone(&sink);
            handles.push(tokio::spawn(async move {
                sink.append("iot_data", json!({"n": n, "pad": "x".repeat(512)}))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = sink.read_collection("iot_data").await.unwrap();
        assert_eq!(stored.len(), 32);
    }

    #[tokio::test]
    async fn test_invalid_collection_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(temp_dir.path());

        let err = sink.append("../escape", json!({})).await.unwrap_err();
        assert!(matches!(err, SinkError::InvalidCollection { .. }));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let sink = JsonLinesSink::new(&blocker);
        let err = sink.append("iot_data", json!({})).await.unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
    }
}
