//! Authentication module
//!
//! Deterministic password hashing plus an in-memory store of opaque,
//! account-scoped auth keys with a fixed lifetime.

mod clock;
mod middleware;
mod password;
mod service;
mod sweeper;
mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use middleware::{AuthKey, AUTH_KEY_HEADER};
pub use password::{Digest, PasswordHasher, DIGEST_LEN, MIN_PASSWORD_LEN};
pub use service::AuthService;
pub use sweeper::spawn_sweeper;
pub use token::{TokenStatus, TokenStore, UserId, TOKEN_ALPHABET, TOKEN_LENGTH};
