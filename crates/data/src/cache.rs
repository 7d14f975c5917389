use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tickerlens_core::{CompanyInfo, DataError, DataProvider, LookbackPeriod, PriceSeries};
use tokio::sync::RwLock;

/// Default lifetime of a cached fetch.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

impl<T: Clone> Entry<T> {
    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.fetched_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

/// Memoizes another provider's answers for a fixed time-to-live.
///
/// History is keyed by (symbol, period) and info by symbol; symbols are
/// compared case-insensitively. Errors are passed through and never stored.
pub struct CachedDataProvider {
    inner: Box<dyn DataProvider>,
    ttl: Duration,
    history: RwLock<HashMap<(String, LookbackPeriod), Entry<PriceSeries>>>,
    info: RwLock<HashMap<String, Entry<CompanyInfo>>>,
}

impl CachedDataProvider {
    pub fn new(inner: impl DataProvider + 'static, ttl: Duration) -> Self {
        Self::from_boxed(Box::new(inner), ttl)
    }

    pub fn from_boxed(inner: Box<dyn DataProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            history: RwLock::new(HashMap::new()),
            info: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every cached entry for `symbol`.
    pub async fn invalidate(&self, symbol: &str) {
        let key = normalize(symbol);
        self.history.write().await.retain(|(s, _), _| *s != key);
        self.info.write().await.remove(&key);
    }

    pub async fn clear(&self) {
        self.history.write().await.clear();
        self.info.write().await.clear();
    }

    /// Remove expired entries; returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut history = self.history.write().await;
        let mut info = self.info.write().await;
        let before = history.len() + info.len();
        history.retain(|_, e| e.fetched_at.elapsed() < ttl);
        info.retain(|_, e| e.fetched_at.elapsed() < ttl);
        before - history.len() - info.len()
    }
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[async_trait]
impl DataProvider for CachedDataProvider {
    async fn load_history(
        &self,
        symbol: &str,
        period: LookbackPeriod,
    ) -> Result<PriceSeries, DataError> {
        let key = (normalize(symbol), period);
        if let Some(hit) = self.history.read().await.get(&key).and_then(|e| e.fresh(self.ttl)) {
            tracing::debug!(symbol = %key.0, %period, "History cache hit");
            return Ok(hit);
        }

        let series = self.inner.load_history(symbol, period).await?;
        tracing::debug!(symbol = %key.0, %period, bars = series.len(), "History cached");
        self.history.write().await.insert(
            key,
            Entry {
                value: series.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(series)
    }

    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, DataError> {
        let key = normalize(symbol);
        if let Some(hit) = self.info.read().await.get(&key).and_then(|e| e.fresh(self.ttl)) {
            tracing::debug!(symbol = %key, "Info cache hit");
            return Ok(hit);
        }

        let info = self.inner.company_info(symbol).await?;
        self.info.write().await.insert(
            key,
            Entry {
                value: info.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(info)
    }
}
