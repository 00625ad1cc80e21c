//! Store interfaces consumed by the cache core.
//!
//! The durable store sits behind these traits. Implementations might use:
//! - In-memory maps (for testing/development)
//! - PostgreSQL or SQLite (for production)
//!
//! Lookups return `Ok(None)` for missing rows; `Err` is reserved for store
//! failures and is surfaced to callers as an internal error without retry.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Document, DocumentId, DocumentSummary, ListingFilter, User, UserId};

// ═══════════════════════════════════════════════════════════════════════════════
// USER STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Persistent user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user and returns the assigned id.
    ///
    /// Fails with `VaultError::Conflict` if the login is taken.
    async fn insert_user(&self, login: &str, password_hash: &str) -> Result<UserId>;

    /// Looks a user up by login.
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>>;

    /// Looks a user up by id.
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENT STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Persistent documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document.
    async fn insert_document(&self, document: Document) -> Result<()>;

    /// Loads a full document, payload included.
    async fn find_document_by_id(&self, id: &DocumentId) -> Result<Option<Document>>;

    /// Loads only the owner of a document.
    async fn find_document_owner_id(&self, id: &DocumentId) -> Result<Option<UserId>>;

    /// Deletes a document. Returns false if it did not exist.
    async fn delete_document(&self, id: &DocumentId) -> Result<bool>;

    /// Lists an owner's documents ordered by name, then creation time.
    async fn list_documents(
        &self,
        owner: UserId,
        filter: Option<&ListingFilter>,
        limit: usize,
    ) -> Result<Vec<DocumentSummary>>;
}
