//! Authentication facade
//!
//! Wires the password hasher and the token store together and exposes the
//! operations the account layer relies on. Failures come back as typed
//! [`AuthError`] values; nothing here panics or retries.

use super::clock::{Clock, SystemClock};
use super::password::{Digest, PasswordHasher};
use super::token::{TokenStatus, TokenStore, UserId};
use crate::config::AuthConfig;
use jingle_shared::AuthError;
use std::sync::Arc;
use std::time::Duration;

/// Authentication service
///
/// Constructed once at startup and shared through `AppState`.
/// Cloning only bumps the token store's reference count.
#[derive(Debug, Clone)]
pub struct AuthService {
    tokens: Arc<TokenStore>,
}

impl AuthService {
    pub fn new(tokens: Arc<TokenStore>) -> Self {
        Self { tokens }
    }

    /// Build from configuration using the system clock
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build from configuration with an explicit clock
    pub fn with_clock(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl = Duration::from_secs(config.token_ttl_secs);
        Self::new(Arc::new(TokenStore::with_clock(ttl, clock)))
    }

    /// Hash a password, propagating `InvalidInput` for short passwords
    #[inline]
    pub fn get_password_hash(&self, password: &str) -> Result<Digest, AuthError> {
        PasswordHasher::hash(password)
    }

    /// Issue a new auth key for an account
    #[inline]
    pub fn new_auth_key(&self, user_id: UserId) -> String {
        self.tokens.issue(user_id)
    }

    /// Check that `auth_key` is a live key belonging to `user_id`
    pub fn is_valid_auth_key(&self, auth_key: &str, user_id: UserId) -> Result<(), AuthError> {
        match self.tokens.validate(auth_key, user_id) {
            TokenStatus::Valid => Ok(()),
            TokenStatus::Expired => Err(AuthError::ExpiredAuthKey),
            TokenStatus::Invalid => Err(AuthError::InvalidAuthKey),
        }
    }

    /// Drop a single key; returns whether it was present
    #[inline]
    pub fn revoke_auth_key(&self, auth_key: &str) -> bool {
        self.tokens.revoke(auth_key)
    }

    /// Drop every key bound to an account (used when it is deleted)
    #[inline]
    pub fn revoke_auth_keys(&self, user_id: UserId) -> usize {
        self.tokens.revoke_all(user_id)
    }

    /// The underlying token store (for the sweeper)
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }
}
