//! DTOs for API requests and responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use docvault_core::types::DocumentSummary;

/// `{"response": ...}` envelope used by auth and delete endpoints.
#[derive(Debug, Serialize)]
pub struct ResponseEnvelope<T> {
    /// Payload
    pub response: T,
}

/// `{"data": ...}` envelope used by document endpoints.
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    /// Payload
    pub data: T,
}

/// `{"<key>": true}` acknowledgement.
pub fn acknowledge(key: impl Into<String>) -> ResponseEnvelope<BTreeMap<String, bool>> {
    ResponseEnvelope {
        response: BTreeMap::from([(key.into(), true)]),
    }
}

/// Request to register a user.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Administrator token
    pub token: String,
    /// Login
    pub login: String,
    /// Password
    pub pswd: String,
}

/// Response for registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Registered login
    pub login: String,
}

/// Request to log in.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    /// Login
    pub login: String,
    /// Password
    pub pswd: String,
}

/// Response for login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Session token
    pub token: String,
}

/// Query parameters for listing documents.
#[derive(Debug, Default, Deserialize)]
pub struct ListDocumentsQuery {
    /// List this user's documents instead of the caller's
    pub login: Option<String>,
    /// Filter attribute
    pub key: Option<String>,
    /// Filter value
    pub value: Option<String>,
    /// Maximum results
    pub limit: Option<usize>,
}

/// Listing entry.
#[derive(Debug, Serialize)]
pub struct DocumentDto {
    /// Document ID
    pub id: String,
    /// Name
    pub name: String,
    /// MIME type
    pub mime: String,
    /// Binary payload
    pub file: bool,
    /// Public visibility
    pub public: bool,
    /// Creation time (`YYYY-MM-DD HH:MM:SS`, UTC)
    pub created: String,
    /// Grant list
    pub grant: Vec<String>,
}

impl From<DocumentSummary> for DocumentDto {
    fn from(summary: DocumentSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            name: summary.name,
            mime: summary.mime,
            file: summary.file,
            public: summary.public,
            created: summary.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            grant: summary.grant,
        }
    }
}

/// Response for listing documents.
#[derive(Debug, Serialize)]
pub struct ListDocumentsResponse {
    /// Matching documents
    pub docs: Vec<DocumentDto>,
}

/// `meta` part of an upload.
#[derive(Debug, Deserialize)]
pub struct UploadMeta {
    /// Document name
    pub name: String,
    /// Payload is in the `file` part rather than the `json` part
    #[serde(default)]
    pub file: bool,
    /// Public visibility
    #[serde(default)]
    pub public: bool,
    /// MIME type
    #[serde(default)]
    pub mime: Option<String>,
    /// Logins given read access
    #[serde(default)]
    pub grant: Vec<String>,
}

/// Response for upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Stored JSON payload, if any
    pub json: Option<serde_json::Value>,
    /// Document name
    pub file: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Stored sessions, including expired ones not yet swept
    pub sessions: usize,
    /// Cached documents and listings
    pub cached_entries: usize,
    /// Document cache hit rate
    pub cache_hit_rate: f64,
}
