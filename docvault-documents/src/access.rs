//! Document visibility.
//!
//! A caller may view a document if they own it, if it is public, or if
//! their login is on its grant list. Nothing else grants access.

use bytes::Bytes;
use serde_json::Value;

use docvault_core::error::{Result, VaultError};
use docvault_core::types::{AccessControlled, Caller, Document, DocumentPayload};

/// Returns true if `caller` may view `doc`.
pub fn can_view<D>(caller: &Caller, doc: &D) -> bool
where
    D: AccessControlled + ?Sized,
{
    caller.id == doc.owner_id() || doc.is_public() || doc.is_granted_to(&caller.login)
}

/// Document contents as handed to the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum ServedDocument {
    /// Structured payload
    Json(Value),
    /// Raw bytes with their declared MIME type
    File {
        /// Declared MIME type
        mime: String,
        /// File contents
        bytes: Bytes,
    },
}

/// Checks visibility and extracts the payload.
pub fn serve(doc: &Document, caller: &Caller) -> Result<ServedDocument> {
    if !can_view(caller, doc) {
        return Err(VaultError::forbidden(format!(
            "no access to document {}",
            doc.id
        )));
    }

    Ok(match &doc.payload {
        DocumentPayload::Json(value) => ServedDocument::Json(value.clone()),
        DocumentPayload::File(bytes) => ServedDocument::File {
            mime: doc.mime.clone(),
            bytes: bytes.clone(),
        },
    })
}
