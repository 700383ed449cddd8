//! In-memory auth key store
//!
//! Issues opaque bearer tokens bound to one account and an issuance instant,
//! and validates them against an expected account and a time-to-live.
//!
//! All state lives behind a single mutex, so every operation observes an
//! entry either whole or not at all. Nothing is persisted: a restart
//! invalidates every token.

use super::clock::{Clock, SystemClock};
use metrics::{counter, gauge};
use parking_lot::Mutex;
use rand::{rngs::OsRng, Rng};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Account identifier
pub type UserId = i64;

/// Length of every issued token
pub const TOKEN_LENGTH: usize = 30;

/// Characters a token is drawn from
pub const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";

/// Outcome of validating a token
///
/// `Invalid` covers unknown, revoked, evicted and
/// wrong-account tokens alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Expired,
    Invalid,
}

#[derive(Debug, Clone, Copy)]
struct TokenEntry {
    user_id: UserId,
    issued_at: Instant,
}

/// Synchronized token map with a fixed time-to-live
#[derive(Debug)]
pub struct TokenStore {
    entries: Mutex<HashMap<String, TokenEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    /// Create a store driven by the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a store driven by a custom clock
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries currently held, including not-yet-evicted expired ones
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Issue a new token for `user_id`
    pub fn issue(&self, user_id: UserId) -> String {
        self.issue_with(user_id, generate_token)
    }

    fn issue_with(&self, user_id: UserId, mut generate: impl FnMut() -> String) -> String {
        let issued_at = self.clock.now();
        let mut entries = self.entries.lock();

        loop {
            match entries.entry(generate()) {
                Entry::Vacant(slot) => {
                    let token = slot.key().clone();
                    slot.insert(TokenEntry { user_id, issued_at });

                    counter!("auth_tokens_issued_total").increment(1);
                    gauge!("auth_tokens_live").set(entries.len() as f64);
                    debug!(user_id, "Issued auth key");

                    return token;
                }
                Entry::Occupied(_) => {
                    warn!(user_id, "Generated auth key collided with a live key, retrying");
                }
            }
        }
    }

    /// Validate `token` for `expected_user`
    ///
    /// An expired entry is evicted by this call whoever presents it, so it
    /// can never validate again. Only its owner is told it expired; anyone
    /// else gets `Invalid`.
    pub fn validate(&self, token: &str, expected_user: UserId) -> TokenStatus {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let Some(entry) = entries.get(token).copied() else {
            return record_outcome(TokenStatus::Invalid, "unknown", expected_user);
        };

        if now.saturating_duration_since(entry.issued_at) >= self.ttl {
            entries.remove(token);
            counter!("auth_tokens_evicted_total", "reason" => "expired").increment(1);
            gauge!("auth_tokens_live").set(entries.len() as f64);

            if entry.user_id == expected_user {
                return record_outcome(TokenStatus::Expired, "expired", expected_user);
            }
            return record_outcome(TokenStatus::Invalid, "expired_owner_mismatch", expected_user);
        }

        if entry.user_id != expected_user {
            return record_outcome(TokenStatus::Invalid, "owner_mismatch", expected_user);
        }

        record_outcome(TokenStatus::Valid, "valid", expected_user)
    }

    /// Remove a single token; returns whether it was present
    pub fn revoke(&self, token: &str) -> bool {
        let mut entries = self.entries.lock();
        let removed = entries.remove(token).is_some();
        if removed {
            counter!("auth_tokens_evicted_total", "reason" => "revoked").increment(1);
            gauge!("auth_tokens_live").set(entries.len() as f64);
        }
        removed
    }

    /// Remove every token bound to `user_id`; returns how many were removed
    pub fn revoke_all(&self, user_id: UserId) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.user_id != user_id);
        let removed = before - entries.len();

        if removed > 0 {
            counter!("auth_tokens_evicted_total", "reason" => "revoked").increment(removed as u64);
            gauge!("auth_tokens_live").set(entries.len() as f64);
        }
        debug!(user_id, removed, "Revoked auth keys for account");
        removed
    }

    /// Evict every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.issued_at) < self.ttl);
        let removed = before - entries.len();

        if removed > 0 {
            counter!("auth_tokens_evicted_total", "reason" => "expired").increment(removed as u64);
            debug!(removed, "Purged expired auth keys");
        }
        gauge!("auth_tokens_live").set(entries.len() as f64);
        removed
    }
}

fn record_outcome(status: TokenStatus, reason: &'static str, user_id: UserId) -> TokenStatus {
    counter!("auth_key_validations_total", "outcome" => reason).increment(1);
    if status != TokenStatus::Valid {
        debug!(user_id, reason, "Auth key rejected");
    }
    status
}

/// Draw a fresh token from the OS random source
fn generate_token() -> String {
    let mut rng = OsRng;
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use proptest::prelude::*;
    use std::collections::HashSet;

    const TTL: Duration = Duration::from_secs(60);

    fn create_test_store() -> (TokenStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (TokenStore::with_clock(TTL, clock.clone()), clock)
    }

    fn is_well_formed(token: &str) -> bool {
        token.len() == TOKEN_LENGTH && token.bytes().all(|b| TOKEN_ALPHABET.contains(&b))
    }

    #[test]
    fn test_issue_then_validate() {
        let (store, _) = create_test_store();
        let token = store.issue(42);

        assert!(is_well_formed(&token), "malformed token {}", token);
        assert_eq!(store.validate(&token, 42), TokenStatus::Valid);
        assert_eq!(store.validate(&token, 42), TokenStatus::Valid);
    }

    #[test]
    fn test_wrong_account_is_invalid() {
        let (store, _) = create_test_store();
        let token = store.issue(42);

        assert_eq!(store.validate(&token, 43), TokenStatus::Invalid);
        // The owner can still use it
        assert_eq!(store.validate(&token, 42), TokenStatus::Valid);
    }

    #[test]
    fn test_unknown_token_is_invalid() {
        let (store, _) = create_test_store();
        store.issue(1);

        assert_eq!(store.validate("", 1), TokenStatus::Invalid);
        assert_eq!(store.validate("NOT_A_REAL_TOKEN_AT_ALL_000000", 1), TokenStatus::Invalid);
    }

    #[test]
    fn test_expiry_boundary() {
        let (store, clock) = create_test_store();
        let token = store.issue(42);

        clock.advance(TTL - Duration::from_millis(1));
        assert_eq!(store.validate(&token, 42), TokenStatus::Valid);

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.validate(&token, 42), TokenStatus::Expired);

        // Evicted: no resurrection
        assert_eq!(store.validate(&token, 42), TokenStatus::Invalid);
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_token_presented_by_other_account() {
        let (store, clock) = create_test_store();
        let token = store.issue(42);

        clock.advance(TTL);
        assert_eq!(store.validate(&token, 43), TokenStatus::Invalid);
        // Evicted even though the owner never asked
        assert_eq!(store.validate(&token, 42), TokenStatus::Invalid);
    }

    #[test]
    fn test_revoke_all_only_touches_one_account() {
        let (store, _) = create_test_store();
        let a1 = store.issue(1);
        let a2 = store.issue(1);
        let b = store.issue(2);

        assert_eq!(store.revoke_all(1), 2);
        assert_eq!(store.validate(&a1, 1), TokenStatus::Invalid);
        assert_eq!(store.validate(&a2, 1), TokenStatus::Invalid);
        assert_eq!(store.validate(&b, 2), TokenStatus::Valid);
        assert_eq!(store.revoke_all(1), 0);
    }

    #[test]
    fn test_revoke_single_token() {
        let (store, _) = create_test_store();
        let keep = store.issue(1);
        let drop = store.issue(1);

        assert!(store.revoke(&drop));
        assert!(!store.revoke(&drop));
        assert_eq!(store.validate(&drop, 1), TokenStatus::Invalid);
        assert_eq!(store.validate(&keep, 1), TokenStatus::Valid);
    }

    #[test]
    fn test_purge_expired() {
        let (store, clock) = create_test_store();
        store.issue(1);
        store.issue(2);
        clock.advance(Duration::from_secs(30));
        let fresh = store.issue(3);
        clock.advance(Duration::from_secs(30));

        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.validate(&fresh, 3), TokenStatus::Valid);
    }

    #[test]
    fn test_collision_is_retried() {
        let (store, _) = create_test_store();
        let first = store.issue_with(1, || "A".repeat(TOKEN_LENGTH));

        let mut candidates = vec!["B".repeat(TOKEN_LENGTH), "A".repeat(TOKEN_LENGTH)];
        let second = store.issue_with(2, || candidates.pop().unwrap());

        assert_eq!(first, "A".repeat(TOKEN_LENGTH));
        assert_eq!(second, "B".repeat(TOKEN_LENGTH));
        assert_eq!(store.validate(&first, 1), TokenStatus::Valid);
        assert_eq!(store.validate(&second, 2), TokenStatus::Valid);
    }

    #[test]
    fn test_concurrent_issue_produces_distinct_tokens() {
        const THREADS: i64 = 8;
        const PER_THREAD: i64 = 250;

        let store = TokenStore::new(TTL);
        let issued: Vec<(i64, String)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|t| {
                    let store = &store;
                    scope.spawn(move || {
                        (0..PER_THREAD)
                            .map(|i| {
                                let user_id = t * PER_THREAD + i;
                                (user_id, store.issue(user_id))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        let unique: HashSet<&str> = issued.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(unique.len(), (THREADS * PER_THREAD) as usize);
        assert_eq!(store.len(), unique.len());
        for (user_id, token) in &issued {
            assert_eq!(store.validate(token, *user_id), TokenStatus::Valid);
        }
    }

    #[test]
    fn test_validate_racing_revoke_is_consistent() {
        let store = TokenStore::new(TTL);
        let tokens: Vec<String> = (0..200).map(|_| store.issue(7)).collect();

        std::thread::scope(|scope| {
            scope.spawn(|| store.revoke_all(7));
            scope.spawn(|| {
                for token in &tokens {
                    let status = store.validate(token, 7);
                    assert!(matches!(status, TokenStatus::Valid | TokenStatus::Invalid));
                }
            });
        });

        assert!(tokens.iter().all(|t| store.validate(t, 7) == TokenStatus::Invalid));
    }

    proptest! {
        #[test]
        fn prop_tokens_are_well_formed(user_id in any::<i64>()) {
            let (store, _) = create_test_store();
            let token = store.issue(user_id);
            prop_assert!(is_well_formed(&token), "malformed token {}", token);
            prop_assert_eq!(store.validate(&token, user_id), TokenStatus::Valid);
        }

        #[test]
        fn prop_other_accounts_never_validate(owner in any::<i64>(), other in any::<i64>()) {
            prop_assume!(owner != other);
            let (store, _) = create_test_store();
            let token = store.issue(owner);
            prop_assert_eq!(store.validate(&token, other), TokenStatus::Invalid);
        }

        #[test]
        fn prop_valid_strictly_before_ttl(elapsed_ms in 0u64..120_000) {
            let (store, clock) = create_test_store();
            let token = store.issue(1);
            clock.advance(Duration::from_millis(elapsed_ms));

            let expected = if Duration::from_millis(elapsed_ms) < TTL {
                TokenStatus::Valid
            } else {
                TokenStatus::Expired
            };
            prop_assert_eq!(store.validate(&token, 1), expected);
        }
    }
}
