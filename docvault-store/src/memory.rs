//! In-memory user and document store.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, instrument};

use docvault_core::error::{Result, VaultError};
use docvault_core::traits::{DocumentStore, UserStore};
use docvault_core::types::{Document, DocumentId, DocumentSummary, ListingFilter, User, UserId};

/// In-memory store.
///
/// Uses sharded concurrent maps, so handlers never contend on a single lock.
///
/// # Indexing
///
/// - Users by id, plus a login → id index that enforces login uniqueness
/// - Documents by id
#[derive(Debug)]
pub struct MemoryStore {
    /// Primary user storage: ID → User
    users: DashMap<UserId, User>,
    /// Login index: login → ID
    logins: DashMap<String, UserId>,
    /// Document storage: ID → Document
    documents: DashMap<DocumentId, Document>,
    /// Next user ID
    next_user_id: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            logins: DashMap::new(),
            documents: DashMap::new(),
            next_user_id: AtomicU64::new(1),
        }
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of stored documents.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Removes all users and documents.
    pub fn clear(&self) {
        self.documents.clear();
        self.logins.clear();
        self.users.clear();
        self.next_user_id.store(1, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    #[instrument(skip(self, password_hash))]
    async fn insert_user(&self, login: &str, password_hash: &str) -> Result<UserId> {
        // The login entry stays locked until the user row exists.
        match self.logins.entry(login.to_owned()) {
            Entry::Occupied(_) => Err(VaultError::Conflict(format!(
                "login '{login}' already exists"
            ))),
            Entry::Vacant(slot) => {
                let id = UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst));
                self.users.insert(
                    id,
                    User {
                        id,
                        login: login.to_owned(),
                        password_hash: password_hash.to_owned(),
                    },
                );
                slot.insert(id);
                debug!(user_id = %id, "Inserted user");
                Ok(id)
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let Some(id) = self.logins.get(login).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    #[instrument(skip(self, document), fields(id = %document.id, owner = %document.owner_id))]
    async fn insert_document(&self, document: Document) -> Result<()> {
        match self.documents.entry(document.id.clone()) {
            Entry::Occupied(_) => Err(VaultError::internal(format!(
                "document id collision: {}",
                document.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(document);
                Ok(())
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_document_by_id(&self, id: &DocumentId) -> Result<Option<Document>> {
        Ok(self.documents.get(id).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self))]
    async fn find_document_owner_id(&self, id: &DocumentId) -> Result<Option<UserId>> {
        Ok(self.documents.get(id).map(|entry| entry.value().owner_id))
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, id: &DocumentId) -> Result<bool> {
        Ok(self.documents.remove(id).is_some())
    }

    #[instrument(skip(self))]
    async fn list_documents(
        &self,
        owner: UserId,
        filter: Option<&ListingFilter>,
        limit: usize,
    ) -> Result<Vec<DocumentSummary>> {
        let mut summaries: Vec<DocumentSummary> = self
            .documents
            .iter()
            .filter(|entry| entry.value().owner_id == owner)
            .map(|entry| entry.value().summary())
            .filter(|summary| filter.map_or(true, |f| f.matches(summary)))
            .collect();

        summaries.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        summaries.truncate(limit);

        debug!(%owner, count = summaries.len(), "Listed documents");
        Ok(summaries)
    }
}
