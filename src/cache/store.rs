//! In-memory TTL-bounded response store.
//!
//! # Design Decisions
//! - DashMap keyed by cache key; a write replaces the whole entry
//!   atomically, readers hold an Arc to whichever version they saw
//! - Readers check freshness themselves; the background sweep only
//!   bounds memory, correctness never depends on it
//! - Headers are stored in serialized form so a decode failure is a
//!   representable condition (forced miss + eviction), not a panic

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use bytes::Bytes;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::cache::policy::Encoding;

/// Failure decoding a stored entry back into a response.
#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("stored status {0} is not a valid status code")]
    BadStatus(u16),

    #[error("stored header {0} failed to decode")]
    BadHeader(String),
}

/// One stored response. Never mutated in place; replaced wholesale.
#[derive(Debug)]
pub struct CacheEntry {
    status: u16,
    headers: Vec<(String, String)>,
    pub body: Bytes,
    pub encoding: Encoding,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    pub fn new(
        status: StatusCode,
        headers: &HeaderMap,
        body: Bytes,
        encoding: Encoding,
        ttl: Duration,
    ) -> Self {
        let headers = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        Self {
            status: status.as_u16(),
            headers,
            body,
            encoding,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// Age-based freshness: fresh while `now - stored_at <= ttl`.
    pub fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() <= self.ttl
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Decode the stored status and headers back into response parts.
    pub fn to_parts(&self) -> Result<(StatusCode, HeaderMap), CacheStoreError> {
        let status =
            StatusCode::from_u16(self.status).map_err(|_| CacheStoreError::BadStatus(self.status))?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name: HeaderName = name
                .parse()
                .map_err(|_| CacheStoreError::BadHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| CacheStoreError::BadHeader(name.to_string()))?;
            headers.append(name, value);
        }

        Ok((status, headers))
    }
}

#[cfg(test)]
impl CacheEntry {
    /// Replace the serialized headers wholesale, bypassing encoding.
    pub(crate) fn with_raw_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }
}

/// Concurrent cache store, the sole owner of stored entries.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: DashMap<String, Arc<CacheEntry>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a fresh entry. Expired entries are dropped on the way out.
    pub fn get(&self, key: &str) -> Option<Arc<CacheEntry>> {
        let entry = self.entries.get(key)?.clone();
        if entry.is_fresh() {
            Some(entry)
        } else {
            drop(self.entries.remove(key));
            None
        }
    }

    /// Store an entry, replacing any prior entry for the key.
    pub fn insert(&self, key: String, entry: CacheEntry) {
        self.entries.insert(key, Arc::new(entry));
    }

    /// Remove an entry. Returns true when something was evicted.
    pub fn evict(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh());
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Spawn the periodic expiry sweep.
pub fn spawn_sweep_task(
    store: Arc<CacheStore>,
    interval_secs: u64,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // The first tick fires immediately; skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.sweep_expired();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = store.len(), "Cache sweep");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cache sweep task received shutdown signal, exiting");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ttl: Duration) -> CacheEntry {
        CacheEntry::new(
            StatusCode::OK,
            &HeaderMap::new(),
            Bytes::from_static(b"body"),
            Encoding::Identity,
            ttl,
        )
    }

    #[test]
    fn fresh_entry_is_served() {
        let store = CacheStore::new();
        store.insert("k".into(), entry(Duration::from_secs(60)));
        assert!(store.get("k").is_some());
    }

    #[test]
    fn expired_entry_is_dropped_on_read() {
        let store = CacheStore::new();
        store.insert("k".into(), entry(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.get("k").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn insert_replaces_prior_entry() {
        let store = CacheStore::new();
        store.insert("k".into(), entry(Duration::from_secs(60)));
        let mut replacement = entry(Duration::from_secs(60));
        replacement.body = Bytes::from_static(b"new");
        store.insert("k".into(), replacement);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k").unwrap().body.as_ref(), b"new");
    }

    #[test]
    fn sweep_removes_only_expired() {
        let store = CacheStore::new();
        store.insert("old".into(), entry(Duration::ZERO));
        store.insert("live".into(), entry(Duration::from_secs(60)));
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(store.sweep_expired(), 1);
        assert!(store.get("live").is_some());
    }

    #[test]
    fn corrupt_header_surfaces_as_store_error() {
        let mut corrupt = entry(Duration::from_secs(60));
        corrupt.headers = vec![("bad header name".into(), "v".into())];
        assert!(matches!(
            corrupt.to_parts(),
            Err(CacheStoreError::BadHeader(_))
        ));
    }

    #[test]
    fn roundtrips_status_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        let entry = CacheEntry::new(
            StatusCode::OK,
            &headers,
            Bytes::new(),
            Encoding::Gzip,
            Duration::from_secs(1),
        );
        let (status, decoded) = entry.to_parts().unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decoded.get("content-type").unwrap(), "text/plain");
    }
}
