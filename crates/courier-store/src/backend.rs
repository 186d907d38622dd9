//! Store backend trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::StoreError;

/// Expiring key-value store trait
///
/// Implementations own expiry enforcement: once `expires_at` has passed,
/// `try_get` must stop returning the value. No ordering or capacity
/// guarantees are required.
#[async_trait]
pub trait ExpiringStore<V: Send + 'static>: Send + Sync {
    /// Look up a live value
    async fn try_get(&self, key: &str) -> Result<Option<V>, StoreError>;

    /// Store a value until the given instant, replacing any previous value
    async fn set(&self, key: &str, value: V, expires_at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
impl<V, S> ExpiringStore<V> for Arc<S>
where
    V: Send + 'static,
    S: ExpiringStore<V> + ?Sized,
{
    async fn try_get(&self, key: &str) -> Result<Option<V>, StoreError> {
        (**self).try_get(key).await
    }

    async fn set(&self, key: &str, value: V, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).set(key, value, expires_at).await
    }
}
