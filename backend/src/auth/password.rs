//! Password hashing using PBKDF2-HMAC-SHA256
//!
//! Produces fixed-length digests that the account layer stores and compares
//! for equality at login.
//!
//! # Known weakness
//!
//! Every password is derived with the same compiled-in salt, so equal
//! passwords produce equal digests and a single precomputed table covers all
//! accounts. Stored digests and the pinned `jingle12` fixture depend on this
//! format; switching to per-user salts requires a stored-format migration.
//!
//! # Performance Considerations
//!
//! Key derivation is intentionally CPU-intensive. Async callers should run
//! it on the blocking pool (`tokio::task::spawn_blocking`).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use jingle_shared::AuthError;
use sha2::Sha256;
use std::fmt;

/// Minimum password length, in UTF-16 code units
pub const MIN_PASSWORD_LEN: usize = 8;

/// Digest length in bytes
pub const DIGEST_LEN: usize = 16;

/// PBKDF2 iteration count shared by all passwords
pub const PBKDF2_ITERATIONS: u32 = 65_536;

/// Salt shared by all passwords
const PBKDF2_SALT: &[u8; 16] = b"jingle-auth-salt";

const PASSWORD_TOO_SHORT: &str = "Password must be a minimum of 8 characters long";

/// Fixed-length password digest
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Rebuild a digest from stored bytes; `None` if the length is wrong
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; DIGEST_LEN]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Standard padded base64, the form used in response payloads
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Digest").field(&self.to_base64()).finish()
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Deterministic password hasher
///
/// Stateless; safe to call from any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Hash a password (blocking operation)
    ///
    /// Fails with [`AuthError::InvalidInput`] for passwords shorter than
    /// [`MIN_PASSWORD_LEN`] UTF-16 code units, without doing any derivation work.
    pub fn hash(password: &str) -> Result<Digest, AuthError> {
        if password.encode_utf16().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(PASSWORD_TOO_SHORT.to_string()));
        }

        let mut out = [0u8; DIGEST_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), PBKDF2_SALT, PBKDF2_ITERATIONS, &mut out);
        Ok(Digest(out))
    }
}
