// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory context store backed by `DashMap`.
//!
//! Used when no Redis URL is configured and as the test double for the
//! funnel's integration tests. Keyed entries expire; log lists are durable
//! for the lifetime of the process.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use coopmob_core::{ContextStore, CoopmobError};
use dashmap::DashMap;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

/// Process-local store. Contexts are lost on restart, which is acceptable
/// for development; production deployments configure Redis.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    lists: DashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries so the map stays bounded under churn.
    fn prune(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| entry.expires_at.is_none_or(|at| at > now));
    }

    /// Snapshot of a log list. Test helper; the trait has no read-back.
    pub fn log_entries(&self, list: &str) -> Vec<String> {
        self.lists
            .get(list)
            .map(|values| values.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContextStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoopmobError> {
        self.prune();
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CoopmobError> {
        self.prune();
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn check_and_set(&self, key: &str, ttl: Duration) -> Result<bool, CoopmobError> {
        self.prune();
        match self.entries.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Entry {
                    value: "1".to_string(),
                    expires_at: Some(Instant::now() + ttl),
                });
                Ok(true)
            }
        }
    }

    async fn push_log(&self, list: &str, value: &str) -> Result<(), CoopmobError> {
        self.lists
            .entry(list.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        store
            .set(
                "lead_ctx:551199",
                "{\"stage\":\"await_city\"}",
                Some(Duration::from_secs(60)),
            )
            .await
            .unwrap();

        let value = store.get("lead_ctx:551199").await.unwrap();
        assert_eq!(value.as_deref(), Some("{\"stage\":\"await_city\"}"));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store
            .set("lead_ctx:551199", "x", Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get("lead_ctx:551199").await.unwrap(), None);
        assert!(store.entries.is_empty(), "prune should drop expired entries");
    }

    #[tokio::test]
    async fn unexpiring_entry_survives_prune() {
        let store = MemoryStore::new();
        store
            .set("lead_final:551199", "{\"aprovado\":true}", None)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.prune();
        assert_eq!(
            store.get("lead_final:551199").await.unwrap().as_deref(),
            Some("{\"aprovado\":true}")
        );
    }

    #[tokio::test]
    async fn check_and_set_claims_exactly_once() {
        let store = MemoryStore::new();
        assert!(store
            .check_and_set("seen_msg:wamid.1", Duration::from_secs(300))
            .await
            .unwrap());
        assert!(!store
            .check_and_set("seen_msg:wamid.1", Duration::from_secs(300))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn check_and_set_reopens_after_expiry() {
        let store = MemoryStore::new();
        assert!(store
            .check_and_set("seen_msg:wamid.2", Duration::from_millis(10))
            .await
            .unwrap());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store
            .check_and_set("seen_msg:wamid.2", Duration::from_millis(10))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn push_log_appends_in_order() {
        let store = MemoryStore::new();
        store.push_log("leads_records", "first").await.unwrap();
        store.push_log("leads_records", "second").await.unwrap();

        assert_eq!(store.log_entries("leads_records"), vec!["first", "second"]);
    }
}
