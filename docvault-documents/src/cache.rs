//! Document and listing cache with per-owner invalidation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use docvault_cache::ExpiringCache;
use docvault_core::types::{Document, DocumentId, Listing, ListingQuery, UserId};

use crate::keys::CacheKey;

/// Value stored in the shared document cache.
#[derive(Clone, Debug)]
pub enum CachedValue {
    /// A full document
    Document(Arc<Document>),
    /// An unfiltered owner listing
    Listing(Arc<Listing>),
}

/// Listing keys cached for one owner.
#[derive(Debug, Default)]
struct OwnerListings {
    /// Bumped on every invalidation
    generation: u64,
    /// Encoded keys of listings published since the last invalidation
    keys: HashSet<String>,
}

/// Cache of documents and listings.
///
/// Every listing key is tracked in its owner's index so that a create or
/// delete can evict all of that owner's listings without touching anyone
/// else's. Each owner also carries a generation: readers take it before
/// going to the store and [`put_listing`](Self::put_listing) refuses results
/// computed before the most recent invalidation.
///
/// Document fills are guarded the same way by a single generation that every
/// document invalidation advances, since a reader does not know the owner
/// until the fetch completes.
pub struct DocumentCache {
    cache: Arc<ExpiringCache<CachedValue>>,
    documents: Mutex<u64>,
    listings: Mutex<HashMap<UserId, OwnerListings>>,
}

impl DocumentCache {
    /// Wraps a cache instance.
    pub fn new(cache: Arc<ExpiringCache<CachedValue>>) -> Self {
        Self {
            cache,
            documents: Mutex::new(0),
            listings: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying cache.
    pub fn inner(&self) -> &Arc<ExpiringCache<CachedValue>> {
        &self.cache
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DOCUMENTS
    // ═══════════════════════════════════════════════════════════════════════

    /// Cached document, if present and live.
    pub fn get_document(&self, id: &DocumentId) -> Option<Arc<Document>> {
        match self.cache.get(&CacheKey::Document(id).encode()) {
            Some(CachedValue::Document(doc)) => {
                debug!(%id, "Document cache hit");
                Some(doc)
            }
            _ => {
                debug!(%id, "Document cache miss");
                None
            }
        }
    }

    /// Current document generation.
    pub fn document_generation(&self) -> u64 {
        *self.documents.lock()
    }

    /// Caches a document loaded at `generation` under the default TTL.
    ///
    /// Returns false, caching nothing, if any document was invalidated after
    /// `generation` was read.
    pub fn put_document(&self, document: Arc<Document>, generation: u64) -> bool {
        let current = self.documents.lock();
        if *current != generation {
            debug!(id = %document.id, generation, current = *current, "Discarded stale document");
            return false;
        }
        let key = CacheKey::Document(&document.id).encode();
        self.cache.insert(key, CachedValue::Document(document));
        true
    }

    /// Evicts a document entry and advances the document generation.
    pub fn invalidate_document(&self, id: &DocumentId) {
        let mut generation = self.documents.lock();
        *generation += 1;
        self.cache.delete(&CacheKey::Document(id).encode());
        debug!(%id, generation = *generation, "Invalidated document");
    }

    // ═══════════════════════════════════════════════════════════════════════
    // LISTINGS
    // ═══════════════════════════════════════════════════════════════════════

    /// Current listing generation for `owner`.
    pub fn listing_generation(&self, owner: UserId) -> u64 {
        self.listings
            .lock()
            .get(&owner)
            .map_or(0, |entry| entry.generation)
    }

    /// Cached listing, if present and live.
    pub fn get_listing(&self, query: &ListingQuery) -> Option<Arc<Listing>> {
        match self.cache.get(&CacheKey::Listing(query).encode()) {
            Some(CachedValue::Listing(listing)) => {
                debug!(owner = %query.owner, "Listing cache hit");
                Some(listing)
            }
            _ => {
                debug!(owner = %query.owner, "Listing cache miss");
                None
            }
        }
    }

    /// Publishes a listing computed at `generation`.
    ///
    /// Returns false, caching nothing, if the owner's listings were
    /// invalidated after `generation` was read.
    pub fn put_listing(&self, query: &ListingQuery, generation: u64, listing: Arc<Listing>) -> bool {
        let key = CacheKey::Listing(query).encode();
        let mut index = self.listings.lock();
        let entry = index.entry(query.owner).or_default();
        if entry.generation != generation {
            debug!(owner = %query.owner, generation, current = entry.generation, "Discarded stale listing");
            return false;
        }

        // Forget keys the cache already expired or swept.
        entry.keys.retain(|k| self.cache.contains_key(k));
        entry.keys.insert(key.clone());
        self.cache.insert(key, CachedValue::Listing(listing));
        true
    }

    /// Evicts every cached listing of `owner` and advances its generation.
    pub fn invalidate_listings(&self, owner: UserId) {
        let mut index = self.listings.lock();
        let entry = index.entry(owner).or_default();
        entry.generation += 1;
        let keys = std::mem::take(&mut entry.keys);
        let evicted = keys.len();
        self.cache.delete_many(keys);
        debug!(%owner, evicted, generation = entry.generation, "Invalidated listings");
    }

    // ═══════════════════════════════════════════════════════════════════════
    // MUTATION HOOKS
    // ═══════════════════════════════════════════════════════════════════════

    /// Invalidation after a document was created.
    pub fn on_document_created(&self, owner: UserId) {
        self.invalidate_listings(owner);
    }

    /// Invalidation after a document was deleted.
    pub fn on_document_deleted(&self, owner: UserId, id: &DocumentId) {
        self.invalidate_document(id);
        self.invalidate_listings(owner);
    }
}
