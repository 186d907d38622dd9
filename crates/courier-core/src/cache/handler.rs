//! Caching transport layer

use async_trait::async_trait;
use chrono::Utc;
use courier_proxy::{ProxyError, Request, Response, Transport};
use courier_store::ExpiringStore;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use super::policy::{expiry, freshness_lifetime, is_cacheable_request};
use super::snapshot::Snapshot;
use crate::error::CoreError;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests answered from the store
    pub hits: u64,
    /// Cacheable requests forwarded because the store had no entry
    pub misses: u64,
    /// Responses written to the store
    pub stores: u64,
    /// Requests forwarded without consulting the store
    pub bypassed: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    bypassed: AtomicU64,
}

/// Transport layer that serves and records cacheable `GET` responses
///
/// Entries are keyed by the absolute request URL. Stored values are
/// `Snapshot`s; every response handed back to a caller is a fresh copy,
/// so callers may consume or drop it without touching the stored entry.
///
/// Concurrent misses for the same URL are not collapsed: each forwards
/// upstream and the last write to the store wins.
pub struct CachingHandler<T, S> {
    inner: T,
    store: S,
    counters: Counters,
}

impl<T, S> CachingHandler<T, S>
where
    T: Transport,
    S: ExpiringStore<Snapshot>,
{
    /// Wrap a transport with a response cache backed by `store`
    pub fn new(inner: T, store: S) -> Self {
        info!("Initializing response cache layer");

        Self {
            inner,
            store,
            counters: Counters::default(),
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            stores: self.counters.stores.load(Ordering::Relaxed),
            bypassed: self.counters.bypassed.load(Ordering::Relaxed),
        }
    }

    /// Send a request through the cache
    pub async fn handle(&self, request: Request) -> Result<Response, CoreError> {
        if !is_cacheable_request(&request) {
            debug!("Bypassing cache for {} {}", request.method, request.url);
            self.record(&self.counters.bypassed, "courier_cache_bypass_total");
            return Ok(self.inner.send(request).await?);
        }

        let key = request.url.as_str().to_string();

        if let Some(cached) = self.store.try_get(&key).await? {
            debug!("Cache hit: {}", key);
            self.record(&self.counters.hits, "courier_cache_hits_total");
            return Ok(cached.to_response());
        }

        debug!("Cache miss: {}", key);
        self.record(&self.counters.misses, "courier_cache_misses_total");

        let response = self.inner.send(request).await?;

        let Some(lifetime) = freshness_lifetime(&response) else {
            debug!("Response for {} is not cacheable ({})", key, response.status);
            return Ok(response);
        };

        let expires_at = expiry(&response.headers, lifetime, Utc::now());
        let snapshot = Snapshot::capture(response).await?;
        let copy = snapshot.to_response();

        debug!(
            "Caching {} ({} bytes) until {}",
            key,
            snapshot.body_len(),
            expires_at
        );

        self.store.set(&key, snapshot, expires_at).await?;
        self.record(&self.counters.stores, "courier_cache_stores_total");

        Ok(copy)
    }

    fn record(&self, counter: &AtomicU64, metric: &'static str) {
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(metric).increment(1);
    }
}

#[async_trait]
impl<T, S> Transport for CachingHandler<T, S>
where
    T: Transport,
    S: ExpiringStore<Snapshot>,
{
    async fn send(&self, request: Request) -> Result<Response, ProxyError> {
        Ok(self.handle(request).await?)
    }
}
