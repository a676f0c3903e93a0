//! Stored document records.
//!
//! A [`Document`] is the atomic stored unit: an id, an arbitrary nested payload,
//! and creation/update timestamps. [`ReplicatedDocument`] is the shape a
//! document arrives in from a peer, where the timestamps may be missing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::{Map, Value};

/// A document stored in a collection.
///
/// # Invariants
///
/// - `updated_at >= created_at`
/// - `created_at` never changes once the document is stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier within the owning collection.
    #[serde(rename = "_id")]
    pub id: String,
    /// The document payload.
    pub data: Map,
    /// When the document was first stored.
    pub created_at: DateTime<Utc>,
    /// When the document payload was last written.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a new document with a freshly generated id and both timestamps set to now.
    pub fn new(data: Map) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the payload wholesale and advances `updated_at`.
    pub fn replace_data(&mut self, data: Map) {
        self.data = data;
        self.updated_at = next_timestamp(self.updated_at);
    }

    /// Returns the payload wrapped as a [`Value::Map`].
    pub fn data_value(&self) -> Value {
        Value::Map(self.data.clone())
    }
}

/// A document received through replication.
///
/// The id is supplied by the origin node. Timestamps are optional because the
/// wire format is parsed permissively; missing ones are filled in when the
/// document is first stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicatedDocument {
    pub id: String,
    pub data: Map,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReplicatedDocument {
    pub fn new(id: impl Into<String>, data: Map) -> Self {
        Self {
            id: id.into(),
            data,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Materializes a stored document, defaulting unset timestamps to now.
    ///
    /// `updated_at` is raised to `created_at` if the origin sent it earlier.
    pub fn into_document(self) -> Document {
        let now = Utc::now();
        let created_at = self.created_at.unwrap_or(now);
        let updated_at = self
            .updated_at
            .unwrap_or(now)
            .max(created_at);

        Document {
            id: self.id,
            data: self.data,
            created_at,
            updated_at,
        }
    }
}

impl From<Document> for ReplicatedDocument {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            data: document.data,
            created_at: Some(document.created_at),
            updated_at: Some(document.updated_at),
        }
    }
}

/// Returns the current time, or one nanosecond past `previous` if the clock
/// has not moved beyond it.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();

    if now > previous {
        now
    } else {
        previous + Duration::nanoseconds(1)
    }
}
