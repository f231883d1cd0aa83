//! Last-known-good cache of exchange-rate factors.
//!
//! Factors are stored as "units of local currency per one unit of foreign
//! currency". A failed refresh never erases the previous values; stale data
//! is served until a refresh succeeds.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Result;

/// Upper bound on a caller-triggered synchronous refresh. The provider
/// carries its own request timeout; this guards against a misbehaving one.
const OPPORTUNISTIC_REFRESH_TIMEOUT: Duration = Duration::from_secs(15);

/// Port for the upstream currency collaborator.
///
/// Returns raw factors keyed by foreign currency code, expressed as foreign
/// units per one unit of the base (local) currency. That is the inverse of
/// what the cache stores.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self) -> Result<HashMap<String, f64>>;
}

#[derive(Default)]
struct RateTable {
    factors: HashMap<String, f64>,
    refreshed_at: Option<DateTime<Utc>>,
}

pub struct RateCache {
    provider: Arc<dyn RateProvider>,
    tracked: Vec<String>,
    inner: RwLock<RateTable>,
}

impl RateCache {
    pub fn new(provider: Arc<dyn RateProvider>, tracked: Vec<String>) -> Self {
        Self {
            provider,
            tracked,
            inner: RwLock::new(RateTable::default()),
        }
    }

    /// Fetch fresh factors and atomically replace the stored ones.
    ///
    /// On failure the prior values stay untouched and the error is returned
    /// for the caller to log.
    pub async fn refresh(&self) -> Result<()> {
        let raw = self.provider.fetch_rates().await?;

        let mut factors = HashMap::new();
        for code in &self.tracked {
            // The provider quotes foreign-per-local; invert to local-per-foreign.
            match raw.get(code) {
                Some(&f) if f.is_finite() && f > 0.0 => {
                    factors.insert(code.clone(), 1.0 / f);
                }
                _ => warn!("no usable factor for {code} in provider response"),
            }
        }

        let mut table = self.inner.write().await;
        table.factors = factors;
        table.refreshed_at = Some(Utc::now());
        info!("rates refreshed: {} of {} tracked currencies", table.factors.len(), self.tracked.len());
        Ok(())
    }

    /// Last known local-per-foreign factor, or `None` if never fetched.
    pub async fn get(&self, code: &str) -> Option<f64> {
        self.inner.read().await.factors.get(code).copied()
    }

    /// Like `get`, but triggers one bounded synchronous refresh when nothing
    /// has ever been cached for this code.
    pub async fn ensure_fresh(&self, code: &str) -> Option<f64> {
        if let Some(v) = self.get(code).await {
            return Some(v);
        }

        match tokio::time::timeout(OPPORTUNISTIC_REFRESH_TIMEOUT, self.refresh()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("opportunistic rate refresh failed: {e}"),
            Err(_) => warn!("opportunistic rate refresh timed out"),
        }
        self.get(code).await
    }

    /// All tracked factors currently cached, in tracked order.
    pub async fn snapshot(&self) -> Vec<(String, f64)> {
        let table = self.inner.read().await;
        self.tracked
            .iter()
            .filter_map(|code| table.factors.get(code).map(|&f| (code.clone(), f)))
            .collect()
    }

    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.refreshed_at
    }

    /// Background refresh loop. The first tick fires immediately, so the
    /// cache fills shortly after startup.
    pub fn spawn_refresh_loop(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tick.tick() => {
                        if let Err(e) = cache.refresh().await {
                            warn!("rate refresh failed, keeping last known factors: {e}");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeProvider {
        raw: HashMap<String, f64>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(raw: Vec<(&str, f64)>) -> Self {
            Self {
                raw: raw.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RateProvider for FakeProvider {
        async fn fetch_rates(&self) -> Result<HashMap<String, f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Provider("upstream down".to_string()));
            }
            Ok(self.raw.clone())
        }
    }

    fn cache_with(provider: Arc<FakeProvider>) -> RateCache {
        RateCache::new(provider, vec!["USD".to_string(), "EUR".to_string()])
    }

    #[tokio::test]
    async fn unfetched_rate_is_unavailable() {
        let cache = cache_with(Arc::new(FakeProvider::new(vec![])));
        assert_eq!(cache.get("USD").await, None);
        assert!(cache.refreshed_at().await.is_none());
    }

    #[tokio::test]
    async fn refresh_inverts_provider_factors() {
        // Provider quotes USD-per-local; cache stores local-per-USD.
        let provider = Arc::new(FakeProvider::new(vec![("USD", 1.0 / 12_700.0)]));
        let cache = cache_with(provider);
        cache.refresh().await.unwrap();

        let usd = cache.get("USD").await.unwrap();
        assert!((usd - 12_700.0).abs() < 1e-6);
        // EUR was absent upstream, so it stays unavailable.
        assert_eq!(cache.get("EUR").await, None);
    }

    #[tokio::test]
    async fn failed_refresh_preserves_last_good_values() {
        let provider = Arc::new(FakeProvider::new(vec![("USD", 1.0 / 12_700.0)]));
        let cache = cache_with(provider.clone());
        cache.refresh().await.unwrap();

        provider.fail.store(true, Ordering::SeqCst);
        assert!(cache.refresh().await.is_err());

        let usd = cache.get("USD").await.unwrap();
        assert!((usd - 12_700.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn zero_and_non_finite_factors_are_skipped() {
        let provider = Arc::new(FakeProvider::new(vec![("USD", 0.0), ("EUR", f64::NAN)]));
        let cache = cache_with(provider);
        cache.refresh().await.unwrap();
        assert_eq!(cache.get("USD").await, None);
        assert_eq!(cache.get("EUR").await, None);
    }

    #[tokio::test]
    async fn ensure_fresh_triggers_one_refresh_when_empty() {
        let provider = Arc::new(FakeProvider::new(vec![("USD", 1.0 / 12_700.0)]));
        let cache = cache_with(provider.clone());

        let usd = cache.ensure_fresh("USD").await.unwrap();
        assert!((usd - 12_700.0).abs() < 1e-6);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        // A second call serves the cached value without refetching.
        cache.ensure_fresh("USD").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn snapshot_follows_tracked_order() {
        let provider = Arc::new(FakeProvider::new(vec![
            ("EUR", 1.0 / 13_850.0),
            ("USD", 1.0 / 12_700.0),
        ]));
        let cache = cache_with(provider);
        cache.refresh().await.unwrap();

        let snap = cache.snapshot().await;
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].0, "USD");
        assert_eq!(snap[1].0, "EUR");
    }
}
