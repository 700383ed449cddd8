//! Auth key extraction
//!
//! Pulls the `Auth-Key` header off the request. Whether the key is valid
//! depends on which account the request targets, so validation happens in
//! the service layer once the account is known.

use crate::error::ApiError;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the auth key
pub const AUTH_KEY_HEADER: &str = "auth-key";

/// Raw auth key presented by the caller
///
/// A missing header is rejected here; a blank or malformed one is passed on
/// and fails validation as an invalid key.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthKey(pub String);

impl AuthKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthKey(..)")
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(AUTH_KEY_HEADER)
            .ok_or_else(|| ApiError::BadRequest("Missing request header 'Auth-Key'".to_string()))?;

        // Non-ASCII garbage can never match an issued key
        let key = value.to_str().unwrap_or_default().trim().to_string();
        Ok(AuthKey(key))
    }
}
