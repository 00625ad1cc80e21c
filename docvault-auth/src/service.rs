//! Registration, login and token authorization.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};

use docvault_core::error::{Result, VaultError};
use docvault_core::traits::UserStore;
use docvault_core::types::{Caller, UserId};
use docvault_core::validation::{validate_login, validate_password};

use crate::password::{hash_password, verify_password, verify_unknown_user};
use crate::session::{SessionRegistry, SessionToken};

/// Authentication front door.
///
/// Owns the session registry and talks to the user store for credentials.
/// Password hashing runs on the blocking thread pool.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: SessionRegistry,
    admin_token: Option<String>,
}

impl AuthService {
    /// Creates the service.
    ///
    /// Without an `admin_token`, registration is always refused.
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: SessionRegistry,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            users,
            sessions,
            admin_token: admin_token.filter(|t| !t.is_empty()),
        }
    }

    /// The underlying session registry.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Registers a user. Requires the administrator token.
    #[instrument(skip(self, admin_token, password))]
    pub async fn register(&self, admin_token: &str, login: &str, password: &str) -> Result<UserId> {
        if !self.is_admin_token(admin_token) {
            warn!("Registration rejected: bad admin token");
            return Err(VaultError::Unauthorized);
        }

        validate_login(login)?;
        validate_password(password)?;

        let password = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| VaultError::internal(format!("hashing task failed: {e}")))??;

        let id = self.users.insert_user(login, &hash).await?;
        info!(user_id = %id, "User registered");
        Ok(id)
    }

    /// Checks credentials and opens a session.
    ///
    /// Unknown logins and wrong passwords fail identically.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<SessionToken> {
        let user = self.users.find_user_by_login(login).await?;

        // Unknown logins still pay for a verification.
        let password = password.to_owned();
        let stored = user.as_ref().map(|u| u.password_hash.clone());
        let valid = tokio::task::spawn_blocking(move || match stored {
            Some(hash) => verify_password(&password, &hash),
            None => Ok(verify_unknown_user(&password)),
        })
        .await
        .map_err(|e| VaultError::internal(format!("verification task failed: {e}")))??;

        match user {
            Some(user) if valid => self.sessions.create_session(Caller::from(&user)),
            _ => {
                warn!("Login rejected");
                Err(VaultError::Unauthorized)
            }
        }
    }

    /// Ends a session. Always succeeds.
    pub fn logout(&self, token: &str) {
        self.sessions.revoke(token);
    }

    /// Resolves a presented token to a caller.
    ///
    /// A missing token and an unknown one are both `Unauthorized`.
    pub fn authorize(&self, token: Option<&str>) -> Result<Caller> {
        token
            .filter(|t| !t.is_empty())
            .and_then(|t| self.sessions.resolve(t))
            .ok_or(VaultError::Unauthorized)
    }

    fn is_admin_token(&self, presented: &str) -> bool {
        self.admin_token
            .as_deref()
            .is_some_and(|expected| bool::from(expected.as_bytes().ct_eq(presented.as_bytes())))
    }
}
