//! # DocVault Auth
//!
//! Token-based authentication for DocVault.
//!
//! - [`SessionRegistry`]: maps opaque session tokens to a [`Caller`], built on
//!   an injected [`ExpiringCache`](docvault_cache::ExpiringCache)
//! - [`password`]: Argon2id hashing and verification
//! - [`AuthService`]: registration, login, logout and token authorization
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use docvault_auth::SessionRegistry;
//! use docvault_cache::ExpiringCache;
//! use docvault_core::{Caller, UserId};
//!
//! let registry = SessionRegistry::new(Arc::new(ExpiringCache::new()));
//! let token = registry.create_session(Caller::new(UserId(1), "alice2024")).unwrap();
//! assert_eq!(registry.resolve(token.as_str()).unwrap().id, UserId(1));
//!
//! registry.revoke(token.as_str());
//! assert!(registry.resolve(token.as_str()).is_none());
//! ```
//!
//! [`Caller`]: docvault_core::Caller

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod password;
mod service;
mod session;

pub use service::AuthService;
pub use session::{SessionRegistry, SessionToken};
