//! Record sink: the "append record to named collection" capability
//!
//! The request handler only ever appends. The sink is a trait object so the
//! handler can be exercised against [`MemorySink`] in tests and dry runs and
//! against [`JsonLinesSink`] in production.
//!
//! - [`jsonl`] - Append-only JSON-lines files, one per collection
//! - [`memory`] - In-memory recording sink with an injectable failure mode

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesSink;
pub use memory::{AppendedRecord, MemorySink};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of generated document identifiers
const DOCUMENT_ID_LEN: usize = 20;

/// Failures reported by a record sink
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error writing collection '{collection}': {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize document for collection '{collection}': {source}")]
    Serialization {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid collection name '{collection}'")]
    InvalidCollection { collection: String },

    #[error("Sink rejected document for collection '{collection}': {message}")]
    Rejected { collection: String, message: String },
}

impl SinkError {
    pub fn io(collection: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            collection: collection.into(),
            source,
        }
    }

    pub fn serialization(collection: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            collection: collection.into(),
            source,
        }
    }

    pub fn rejected(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            collection: collection.into(),
            message: message.into(),
        }
    }
}

/// Durable append-only destination for parsed records
///
/// Implementations must be safe to call from many request tasks at once.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Append one document to the named collection
    async fn append(&self, collection: &str, document: serde_json::Value)
    -> Result<(), SinkError>;
}

/// Envelope written for every appended document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub collection: String,
    pub stored_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl StoredDocument {
    pub fn new(collection: &str, data: serde_json::Value) -> Self {
        Self {
            id: generate_document_id(),
            collection: collection.to_string(),
            stored_at: Utc::now(),
            data,
        }
    }
}

/// Random alphanumeric identifier for a stored document
pub fn generate_document_id() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(DOCUMENT_ID_LEN)
        .map(char::from)
        .collect()
}

/// Reject collection names that could escape the sink's storage namespace
pub fn validate_collection_name(collection: &str) -> Result<(), SinkError> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(SinkError::InvalidCollection {
            collection: collection.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name_validation() {
        assert!(validate_collection_name("iot_data").is_ok());
        assert!(validate_collection_name("clima-data2").is_ok());

        for name in ["", "../etc", "a/b", "data.jsonl", "with space"] {
            assert!(
                matches!(
                    validate_collection_name(name),
                    Err(SinkError::InvalidCollection { .. })
                ),
                "expected {:?} to be rejected",
                name
            );
        }
    }

    #[test]
    fn test_document_ids_are_unique_alphanumeric() {
        let first = generate_document_id();
        let second = generate_document_id();

        assert_eq!(first.len(), DOCUMENT_ID_LEN);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_stored_document_envelope() {
        let doc = StoredDocument::new("iot_data", serde_json::json!({"device_name": "SensorA"}));
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["collection"], "iot_data");
        assert_eq!(value["data"]["device_name"], "SensorA");
        assert!(value["stored_at"].is_string());
    }
}
