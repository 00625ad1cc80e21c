//! Users and authenticated callers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned user identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user as persisted by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// Unique, immutable login
    pub login: String,
    /// PHC-formatted password hash
    pub password_hash: String,
}

/// The identity a session token resolves to.
///
/// Produced once by authentication and passed explicitly to every
/// protected operation. The login is kept next to the id because grant
/// lists are expressed in logins.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    /// User identifier
    pub id: UserId,
    /// User login
    pub login: String,
}

impl Caller {
    /// Creates a caller identity.
    pub fn new(id: UserId, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
        }
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.login.clone())
    }
}
