//! Error types and result types for document store operations.
//!
//! This module provides the error taxonomy shared by every store backend and by
//! the query engine. Use [`DocumentStoreResult<T>`] as the return type for
//! fallible operations.

use serde_json::Error as SerdeJsonError;
use std::convert::Infallible;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
///
/// Every variant is raised synchronously to the immediate caller; none of them
/// are retried by the store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentStoreError {
    /// The requested project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    /// The requested collection does not exist in the project.
    /// The first argument is the collection ID, the second is the project ID.
    #[error("collection not found: {0} in project {1}")]
    CollectionNotFound(String, String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection ID.
    #[error("document not found: {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// A project with the given ID already exists.
    #[error("project already exists: {0}")]
    ProjectAlreadyExists(String),
    /// A collection with the given ID already exists in the project.
    /// The first argument is the collection ID, the second is the project ID.
    #[error("collection already exists: {0} in project {1}")]
    CollectionAlreadyExists(String, String),
    /// A `$`-prefixed filter key is not a known operator.
    #[error("invalid operator: {0}")]
    InvalidOperator(String),
    /// The filter is not a mapping of keys to conditions.
    #[error("invalid filter: {0}")]
    InvalidFilterShape(String),
    /// A document payload is not a mapping.
    #[error("invalid document data: {0}")]
    InvalidDataShape(String),
    /// Serialization/deserialization error when converting to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DocumentStoreError {
    /// Returns `true` for any of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::ProjectNotFound(_)
                | DocumentStoreError::CollectionNotFound(..)
                | DocumentStoreError::DocumentNotFound(..)
        )
    }

    /// Returns `true` for any of the already-exists variants.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::ProjectAlreadyExists(_)
                | DocumentStoreError::CollectionAlreadyExists(..)
        )
    }

    /// Returns `true` when the caller supplied a malformed filter or payload.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::InvalidOperator(_)
                | DocumentStoreError::InvalidFilterShape(_)
                | DocumentStoreError::InvalidDataShape(_)
        )
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<Infallible> for DocumentStoreError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
