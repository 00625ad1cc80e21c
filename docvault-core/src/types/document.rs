//! Documents and their listing projection.
//!
//! A document is either a file (opaque bytes with a declared MIME type) or a
//! structured JSON value. The payload enum makes the two shapes mutually
//! exclusive, so `is_file` can never disagree with the stored data.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::JSON_MIME;
use crate::error::{Result, VaultError};
use crate::types::UserId;

/// Opaque, globally unique document identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document contents.
#[derive(Clone, Debug, PartialEq)]
pub enum DocumentPayload {
    /// Structured data, served as JSON
    Json(serde_json::Value),
    /// Raw bytes, served with the document's MIME type
    File(Bytes),
}

impl DocumentPayload {
    /// Returns true for binary payloads.
    pub fn is_file(&self) -> bool {
        matches!(self, DocumentPayload::File(_))
    }
}

/// Anything that carries the fields the visibility rule inspects.
pub trait AccessControlled {
    /// Owner of the resource.
    fn owner_id(&self) -> UserId;
    /// Whether every authenticated caller may see it.
    fn is_public(&self) -> bool;
    /// Whether `login` appears in the explicit grant list.
    fn is_granted_to(&self, login: &str) -> bool;
}

/// A stored document. Immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Unique identifier
    pub id: DocumentId,
    /// Creator and owner
    pub owner_id: UserId,
    /// Display name
    pub name: String,
    /// Declared MIME type
    pub mime: String,
    /// Visible to every authenticated caller
    pub public: bool,
    /// Logins given explicit read access
    pub grant: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Contents
    pub payload: DocumentPayload,
}

impl Document {
    /// Returns true if the document holds raw bytes.
    pub fn is_file(&self) -> bool {
        self.payload.is_file()
    }

    /// Payload-free projection used in listings.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            owner_id: self.owner_id,
            name: self.name.clone(),
            mime: self.mime.clone(),
            file: self.is_file(),
            public: self.public,
            grant: self.grant.clone(),
            created_at: self.created_at,
        }
    }
}

impl AccessControlled for Document {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }

    fn is_public(&self) -> bool {
        self.public
    }

    fn is_granted_to(&self, login: &str) -> bool {
        self.grant.iter().any(|g| g == login)
    }
}

/// Listing entry: everything about a document except its contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Unique identifier
    pub id: DocumentId,
    /// Owner
    pub owner_id: UserId,
    /// Display name
    pub name: String,
    /// Declared MIME type
    pub mime: String,
    /// Binary payload
    pub file: bool,
    /// Public visibility
    pub public: bool,
    /// Explicit grant list
    pub grant: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl AccessControlled for DocumentSummary {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }

    fn is_public(&self) -> bool {
        self.public
    }

    fn is_granted_to(&self, login: &str) -> bool {
        self.grant.iter().any(|g| g == login)
    }
}

/// Caller-supplied data for a new document.
#[derive(Clone, Debug, PartialEq)]
pub struct NewDocument {
    /// Display name
    pub name: String,
    /// Declared MIME type; defaults to JSON for structured payloads
    pub mime: String,
    /// Public visibility
    pub public: bool,
    /// Logins given explicit read access
    pub grant: Vec<String>,
    /// Contents
    pub payload: DocumentPayload,
}

impl NewDocument {
    /// Checks the metadata and normalizes the grant list.
    pub fn validate(mut self) -> Result<Self> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(VaultError::invalid_input("document name cannot be empty"));
        }

        self.grant = self
            .grant
            .into_iter()
            .map(|login| login.trim().to_owned())
            .filter(|login| !login.is_empty())
            .collect();
        self.grant.sort();
        self.grant.dedup();

        self.mime = self.mime.trim().to_owned();
        if self.mime.is_empty() {
            if self.payload.is_file() {
                return Err(VaultError::invalid_input("file documents require a MIME type"));
            }
            self.mime = JSON_MIME.to_owned();
        }

        Ok(self)
    }

    /// Builds the stored document, assigning an id and creation time.
    pub fn into_document(self, owner_id: UserId) -> Document {
        Document {
            id: DocumentId::generate(),
            owner_id,
            name: self.name,
            mime: self.mime,
            public: self.public,
            grant: self.grant,
            created_at: Utc::now(),
            payload: self.payload,
        }
    }
}
