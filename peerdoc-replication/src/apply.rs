//! Receiving side: applying a peer's payload to the local store.

use tracing::debug;

use peerdoc_core::{backend::StoreBackend, document::ReplicatedDocument, error::DocumentStoreError};

use crate::{
    error::{ReplicationError, Result},
    payload::{Operation, ReplicationPayload},
};

// Absent fields decode as empty strings, so empty and missing are one case.
fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        Err(ReplicationError::InvalidPayload(format!("missing {field}")))
    } else {
        Ok(value)
    }
}

/// Applies a received payload to `backend`.
///
/// Deletes go through [`StoreBackend::delete`], so deleting a document this
/// node never saw is an error. Everything else is an idempotent
/// [`StoreBackend::insert_with_id`]; the incoming timestamps are used only
/// when the document is new here, and unparseable ones count as absent.
///
/// Replication is never re-triggered from here.
pub async fn apply<B>(backend: &B, payload: ReplicationPayload) -> Result<()>
where
    B: StoreBackend + ?Sized,
{
    let project = require("project", &payload.project)?;
    let collection = require("collection", &payload.collection)?;
    let id = require("id", &payload.id)?;

    debug!(project, collection, id, operation = ?payload.operation(), "Applying replicated change");

    match payload.operation() {
        Operation::Delete => {
            backend.delete(project, collection, id).await?;
        },
        Operation::Upsert => {
            let data = payload
                .data
                .clone()
                .ok_or_else(|| DocumentStoreError::InvalidDataShape("replicated data is missing".to_string()))?
                .into_map()?;

            let mut document = ReplicatedDocument::new(id, data);
            document.created_at = payload.created_at();
            document.updated_at = payload.updated_at();

            backend.insert_with_id(project, collection, document).await?;
        },
    }

    Ok(())
}
