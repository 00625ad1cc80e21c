//! Expiring key-value cache for DocVault.
//!
//! Generic in-memory cache with per-entry deadlines, optional capacity and a
//! background [`Sweeper`] that evicts expired entries in small batches.
//! Sessions and document lookups are both built on [`ExpiringCache`].

mod cache;
mod sweeper;

pub use cache::{CacheConfig, CacheStats, ExpiringCache};
pub use sweeper::Sweeper;
