//! # DocVault Documents
//!
//! Everything between an authenticated caller and the document store:
//!
//! - **Keys**: structured, serde-encoded cache keys
//! - **Cache**: document and listing entries with per-owner invalidation
//! - **Access**: the visibility predicate and document serving
//! - **Service**: read-through create / get / list / delete
//!
//! ## Example
//!
//! ```rust,ignore
//! use docvault_documents::{DocumentCache, DocumentService};
//!
//! let service = DocumentService::new(store.clone(), store, DocumentCache::new(cache));
//! let doc = service.create(&caller, new_document).await?;
//! let served = service.get(&caller, &doc.id).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod access;
mod cache;
mod keys;
mod service;

pub use access::{can_view, serve, ServedDocument};
pub use cache::{CachedValue, DocumentCache};
pub use keys::CacheKey;
pub use service::{DocumentService, ListingRequest};
