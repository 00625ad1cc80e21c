//! Domain types for DocVault.
//!
//! - [`Caller`]: the authenticated identity a session resolves to
//! - [`Document`]: a stored file or JSON document with its access metadata
//! - [`DocumentSummary`]: the payload-free projection used by listings
//! - [`ListingQuery`]: owner + filter + limit, the identity of a listing

mod document;
mod listing;
mod user;

pub use document::*;
pub use listing::*;
pub use user::*;
