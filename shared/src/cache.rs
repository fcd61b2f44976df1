//! Time-bounded single-value cache for credentials and access tokens.
//!
//! A `TtlCache` lives in the long-lived Lambda state, so a warm container
//! reuses whatever it fetched on a previous invocation until the entry ages out.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::Result;

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// Holds at most one value together with its expiry.
pub struct TtlCache<T> {
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            entry: RwLock::new(None),
        }
    }

    /// Return the cached value if it has not expired.
    pub async fn get(&self) -> Option<T> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|e| Instant::now() < e.expires_at)
            .map(|e| e.value.clone())
    }

    /// Return the cached value, or run `refresh` and keep its result for `ttl`.
    pub async fn get_or_refresh<F, Fut>(&self, ttl: Duration, refresh: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.get_or_refresh_with(|| async move { refresh().await.map(|value| (value, ttl)) })
            .await
    }

    /// Like [`get_or_refresh`](Self::get_or_refresh), but the refresh decides the TTL.
    ///
    /// A failed refresh propagates its error and stores nothing.
    pub async fn get_or_refresh_with<F, Fut>(&self, refresh: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(T, Duration)>>,
    {
        if let Some(value) = self.get().await {
            return Ok(value);
        }

        let (value, ttl) = refresh().await?;

        // A TTL too large to represent as an Instant is not cached at all.
        let mut entry = self.entry.write().await;
        *entry = Instant::now().checked_add(ttl).map(|expires_at| Entry {
            value: value.clone(),
            expires_at,
        });

        Ok(value)
    }

    /// Drop the cached value (e.g. after the provider rejects a token).
    pub async fn invalidate(&self) {
        let mut entry = self.entry.write().await;
        *entry = None;
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_reuses_value_within_ttl() {
        let cache = TtlCache::new();
        let counter = AtomicU32::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value = cache
                .get_or_refresh(Duration::from_secs(60), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("token-1".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "token-1");
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refreshes_after_expiry() {
        let cache = TtlCache::new();

        let first = cache
            .get_or_refresh(Duration::ZERO, || async { Ok(1u32) })
            .await
            .unwrap();
        let second = cache
            .get_or_refresh(Duration::ZERO, || async { Ok(2u32) })
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_propagates_and_stores_nothing() {
        let cache: TtlCache<String> = TtlCache::new();

        let err = cache
            .get_or_refresh(Duration::from_secs(60), || async {
                Err(Error::Internal("secrets unavailable".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_valid_entry_skips_refresh() {
        let cache = TtlCache::new();
        cache
            .get_or_refresh(Duration::from_secs(60), || async { Ok("cached".to_string()) })
            .await
            .unwrap();

        let value = cache
            .get_or_refresh_with(|| async { Err(Error::Internal("not called".into())) })
            .await
            .unwrap();
        assert_eq!(value, "cached");

        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_chooses_ttl() {
        let cache = TtlCache::new();
        cache
            .get_or_refresh_with(|| async { Ok(("short".to_string(), Duration::ZERO)) })
            .await
            .unwrap();
        assert!(cache.get().await.is_none());

        cache
            .get_or_refresh_with(|| async { Ok(("long".to_string(), Duration::from_secs(1500))) })
            .await
            .unwrap();
        assert_eq!(cache.get().await.as_deref(), Some("long"));
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_is_not_cached() {
        let cache = TtlCache::new();
        let value = cache
            .get_or_refresh(Duration::MAX, || async { Ok("huge".to_string()) })
            .await
            .unwrap();

        assert_eq!(value, "huge");
        assert!(cache.get().await.is_none());
    }
}
