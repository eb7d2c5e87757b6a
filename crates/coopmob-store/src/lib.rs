// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context store backends for the CoopMob intake funnel.
//!
//! Provides the Redis-backed production store, an in-memory fallback for
//! development and tests, and the delivery dedup gate. All backends
//! implement [`coopmob_core::ContextStore`].

use std::sync::Arc;

use coopmob_core::{ContextStore, CoopmobError};

pub mod dedup;
pub mod memory;
pub mod redis;

pub use self::redis::{RedisStore, UrlSummary, describe_url};
pub use dedup::{DEFAULT_SEEN_TTL, DedupGate};
pub use memory::MemoryStore;

/// Select the store backend from the configured Redis URL.
///
/// When Redis is unreachable at startup the funnel still has to answer the
/// webhook, so this degrades to the in-memory store with a warning instead
/// of refusing to start.
pub async fn build_store(redis_url: Option<&str>) -> Result<Arc<dyn ContextStore>, CoopmobError> {
    match redis_url {
        Some(url) => match RedisStore::connect(url).await {
            Ok(store) => {
                tracing::info!("context store: redis");
                Ok(Arc::new(store))
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "redis unreachable; falling back to in-memory store (contexts lost on restart)"
                );
                Ok(Arc::new(MemoryStore::new()))
            }
        },
        None => {
            tracing::info!("context store: in-memory (contexts lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
