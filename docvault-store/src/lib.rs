//! # DocVault Store
//!
//! Storage backends for users and documents.
//!
//! - **Memory**: concurrent in-memory maps for development, testing and
//!   single-process deployments
//!
//! Any other backend (PostgreSQL, SQLite, ...) plugs in by implementing
//! [`UserStore`] and [`DocumentStore`] from `docvault-core`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use docvault_store::{MemoryStore, UserStore};
//!
//! let store = MemoryStore::new();
//! let id = store.insert_user("alice2024", "$argon2id$...").await?;
//! let user = store.find_user_by_id(id).await?.unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;

pub use memory::MemoryStore;

// Re-export the traits from core
pub use docvault_core::traits::{DocumentStore, UserStore};
