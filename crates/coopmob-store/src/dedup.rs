// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery dedup gate.
//!
//! WhatsApp redelivers webhook payloads until acknowledged, so every
//! delivery id is claimed atomically before any side effect runs. A replay
//! within the window is reported as seen and the caller short-circuits.

use std::sync::Arc;
use std::time::Duration;

use coopmob_core::{ContextStore, DeliveryId};

/// Default replay window, matching WhatsApp's redelivery horizon.
pub const DEFAULT_SEEN_TTL: Duration = Duration::from_secs(300);

/// Claims delivery ids via `check_and_set` on the shared store.
#[derive(Clone)]
pub struct DedupGate {
    store: Arc<dyn ContextStore>,
    ttl: Duration,
}

impl DedupGate {
    pub fn new(store: Arc<dyn ContextStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// True when this delivery id was already handled within the window.
    ///
    /// The first call for an id claims it and returns false; later calls
    /// return true. A store failure is treated as unseen so a flaky store
    /// drops dedup protection rather than messages.
    pub async fn seen(&self, delivery_id: &DeliveryId) -> bool {
        let key = format!("seen_msg:{}", delivery_id.as_str());
        match self.store.check_and_set(&key, self.ttl).await {
            Ok(claimed) => !claimed,
            Err(error) => {
                tracing::warn!(error = %error, "dedup check failed; treating delivery as new");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn first_delivery_is_unseen_then_seen() {
        let store = Arc::new(MemoryStore::new());
        let gate = DedupGate::new(store, DEFAULT_SEEN_TTL);
        let id = DeliveryId("wamid.ABC".to_string());

        assert!(!gate.seen(&id).await);
        assert!(gate.seen(&id).await);
        assert!(gate.seen(&id).await);
    }

    #[tokio::test]
    async fn distinct_ids_do_not_collide() {
        let store = Arc::new(MemoryStore::new());
        let gate = DedupGate::new(store, DEFAULT_SEEN_TTL);

        assert!(!gate.seen(&DeliveryId("wamid.A".to_string())).await);
        assert!(!gate.seen(&DeliveryId("wamid.B".to_string())).await);
    }

    #[tokio::test]
    async fn window_reopens_after_expiry() {
        let store = Arc::new(MemoryStore::new());
        let gate = DedupGate::new(store, Duration::from_millis(10));
        let id = DeliveryId("wamid.TTL".to_string());

        assert!(!gate.seen(&id).await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!gate.seen(&id).await);
    }
}
