//! Background eviction of expired auth keys
//!
//! Validation already evicts lazily; the sweeper keeps keys that are never
//! presented again from accumulating.

use super::token::TokenStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Spawn a task that purges expired keys every `every`
///
/// Returns `None` when `every` is zero (sweeping disabled).
pub fn spawn_sweeper(store: Arc<TokenStore>, every: Duration) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        info!("Auth key sweeper disabled");
        return None;
    }

    info!(interval_secs = every.as_secs(), "Starting auth key sweeper");
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = store.purge_expired();
            if removed > 0 {
                debug!(removed, remaining = store.len(), "Auth key sweep finished");
            }
        }
    }))
}
