//! Cache key construction.
//!
//! Keys are JSON arrays: `["doc", id]` and
//! `["docs", owner, field, value, limit]`. String components are escaped by
//! the encoder, so no filter value can make two different queries share a key.

use serde_json::json;

use docvault_core::types::{DocumentId, ListingQuery};

/// Structured key for the document cache.
#[derive(Clone, Copy, Debug)]
pub enum CacheKey<'a> {
    /// A single document, payload included.
    Document(&'a DocumentId),
    /// One owner's listing under a filter and limit.
    Listing(&'a ListingQuery),
}

impl CacheKey<'_> {
    /// Deterministic string form used as the cache key.
    pub fn encode(&self) -> String {
        match self {
            CacheKey::Document(id) => json!(["doc", id.as_str()]).to_string(),
            CacheKey::Listing(query) => {
                let (field, value) = match &query.filter {
                    Some(filter) => (Some(filter.field().as_str()), Some(filter.value())),
                    None => (None, None),
                };
                json!(["docs", query.owner.0, field, value, query.limit]).to_string()
            }
        }
    }
}
