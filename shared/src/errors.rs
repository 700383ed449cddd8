//! Error types for the Jingle accounts core

use thiserror::Error;

/// Authentication error kinds surfaced by the auth core
///
/// The account layer maps these onto its own response codes; the core only
/// guarantees that they stay distinguishable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Malformed or undersized input (e.g. a password that is too short)
    #[error("{0}")]
    InvalidInput(String),

    /// Token missing, malformed, revoked or bound to another account
    #[error("Invalid auth key")]
    InvalidAuthKey,

    /// Token was genuine but its lifetime has elapsed
    #[error("Expired auth key")]
    ExpiredAuthKey,
}

impl AuthError {
    /// Whether the caller should re-authenticate to recover
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidAuthKey | AuthError::ExpiredAuthKey)
    }
}
