//! In-memory store backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::ExpiringStore;
use crate::error::StoreError;

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// In-memory expiring store
///
/// Expired entries are never returned; they are physically removed by
/// `purge_expired` (or `spawn_purge_task`), or overwritten by a later `set`.
pub struct MemoryStore<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> MemoryStore<V> {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Expiry recorded for a key, whether or not it has passed
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.read().get(key).map(|e| e.expires_at)
    }

    /// Remove every entry whose expiry has passed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl<V> ExpiringStore<V> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn try_get(&self, key: &str) -> Result<Option<V>, StoreError> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                debug!("Entry expired: {}", key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: V, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        debug!("Storing entry {} until {}", key, expires_at);
        self.entries
            .write()
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}

/// Spawn a background task that purges expired entries periodically
pub fn spawn_purge_task<V>(
    store: Arc<MemoryStore<V>>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    use tokio::time::{Duration, interval};

    info!(
        "Starting background purge task (interval: {} seconds)",
        interval_secs
    );

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_secs));

        // Skip the first tick (which fires immediately)
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let purged = store.purge_expired();
            if purged > 0 {
                info!("Purged {} expired entries", purged);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_set_then_get() {
        let store: MemoryStore<String> = MemoryStore::new();
        store
            .set("http://x/y", "abc".to_string(), Utc::now() + Duration::seconds(30))
            .await
            .unwrap();

        assert_eq!(store.try_get("http://x/y").await.unwrap(), Some("abc".to_string()));
        assert_eq!(store.try_get("http://x/z").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_invisible() {
        let store: MemoryStore<u32> = MemoryStore::new();
        let expires_at = Utc::now() - Duration::seconds(1);
        store.set("k", 1u32, expires_at).await.unwrap();

        assert_eq!(store.try_get("k").await.unwrap(), None);
        assert_eq!(store.expires_at("k"), Some(expires_at));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_last_set_wins() {
        let store: MemoryStore<u32> = MemoryStore::new();
        let later = Utc::now() + Duration::seconds(60);
        store.set("k", 1u32, Utc::now() + Duration::seconds(30)).await.unwrap();
        store.set("k", 2u32, later).await.unwrap();

        assert_eq!(store.try_get("k").await.unwrap(), Some(2));
        assert_eq!(store.expires_at("k"), Some(later));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store: MemoryStore<u32> = MemoryStore::new();
        store.set("old", 1u32, Utc::now() - Duration::seconds(5)).await.unwrap();
        store.set("new", 2u32, Utc::now() + Duration::seconds(60)).await.unwrap();

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.expires_at("old").is_none());
        assert_eq!(store.try_get("new").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_shared_store_through_arc() {
        let store: Arc<MemoryStore<u32>> = Arc::new(MemoryStore::new());
        let handle = store.clone();
        ExpiringStore::<u32>::set(&handle, "k", 7, Utc::now() + Duration::seconds(10))
            .await
            .unwrap();

        assert_eq!(ExpiringStore::<u32>::try_get(&store, "k").await.unwrap(), Some(7));
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_task_runs_after_first_interval() {
        let store: Arc<MemoryStore<u32>> = Arc::new(MemoryStore::new());
        ExpiringStore::<u32>::set(&store, "old", 1, Utc::now() - Duration::seconds(5))
            .await
            .unwrap();

        let task = spawn_purge_task(store.clone(), 1);

        // The immediate first tick is skipped
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert_eq!(store.len(), 1);

        tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
        assert_eq!(store.len(), 0);

        task.abort();
    }
}
