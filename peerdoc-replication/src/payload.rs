//! Replication wire payload.
//!
//! A payload is a flat JSON object naming the document and carrying either
//! its full data (create, update) or just its identity and timestamps
//! (delete):
//!
//! ```text
//! { "project": "acme", "collection": "users", "id": "...",
//!   "data": { ... },
//!   "created_at": "2024-05-01T12:00:00.123456789Z",
//!   "updated_at": "2024-05-01T12:00:00.123456789Z",
//!   "operation": "update" }
//! ```
//!
//! `operation` is absent on creates, `"update"` on updates and `"delete"` on
//! deletes. Receivers treat anything but `"delete"` as an upsert.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use peerdoc_core::{document::Document, value::Value};

const OPERATION_UPDATE: &str = "update";
const OPERATION_DELETE: &str = "delete";

/// What a receiver does with a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Insert or overwrite the document with the carried data.
    Upsert,
    /// Remove the document.
    Delete,
}

/// One replicated change, as sent to `POST /replicate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationPayload {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl ReplicationPayload {
    fn from_document(project: &str, collection: &str, document: &Document) -> Self {
        Self {
            project: project.to_string(),
            collection: collection.to_string(),
            id: document.id.clone(),
            data: Some(document.data_value()),
            created_at: Some(format_timestamp(document.created_at)),
            updated_at: Some(format_timestamp(document.updated_at)),
            operation: None,
        }
    }

    /// Payload announcing a newly created document.
    pub fn created(project: &str, collection: &str, document: &Document) -> Self {
        Self::from_document(project, collection, document)
    }

    /// Payload announcing new data for an existing document.
    pub fn updated(project: &str, collection: &str, document: &Document) -> Self {
        Self {
            operation: Some(OPERATION_UPDATE.to_string()),
            ..Self::from_document(project, collection, document)
        }
    }

    /// Payload announcing the removal of `document`.
    pub fn deleted(project: &str, collection: &str, document: &Document) -> Self {
        Self {
            data: None,
            operation: Some(OPERATION_DELETE.to_string()),
            ..Self::from_document(project, collection, document)
        }
    }

    pub fn operation(&self) -> Operation {
        match self.operation.as_deref() {
            Some(OPERATION_DELETE) => Operation::Delete,
            _ => Operation::Upsert,
        }
    }

    /// Origin creation time, if present and parseable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// Origin modification time, if present and parseable.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }
}

// Any non-string value decodes as absent rather than failing the payload.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Some(value),
        _ => None,
    })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}
