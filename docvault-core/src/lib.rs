//! # DocVault Core
//!
//! Core types, errors, and traits shared by every DocVault crate.
//!
//! - **Types**: users, authenticated callers, documents, listing queries
//! - **Errors**: the [`VaultError`] taxonomy and its stable [`ErrorKind`] codes
//! - **Constants**: default TTLs, sweep cadence, listing limits
//! - **Traits**: the [`UserStore`] and [`DocumentStore`] interfaces the cache core consumes
//! - **Validation**: login and password format rules
//!
//! ## Example
//!
//! ```rust
//! use docvault_core::{Caller, UserId};
//!
//! let caller = Caller::new(UserId(1), "alice2024");
//! assert_eq!(caller.login, "alice2024");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{ErrorKind, Result, VaultError};
pub use traits::*;
pub use types::*;
