//! Date-keyed local cache for fetched rate records.
//!
//! Keys are constructed through [`CacheKey`] rather than ad hoc string
//! concatenation; the versioned prefix lets an on-disk store survive
//! format changes. Past-date entries never expire (published history is
//! immutable), so the store itself carries no TTL logic; freshness is the
//! reconciliation layer's decision.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Currency, ProviderId, RateDate, RateRecord};

const KEY_PREFIX: &str = "fx_cache_v1";

/// Typed cache key: source, publish date, and optionally the currency
/// when the source caches per-currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: ProviderId,
    pub date: RateDate,
    pub currency: Option<Currency>,
}

impl CacheKey {
    pub const fn new(source: ProviderId, date: RateDate, currency: Option<Currency>) -> Self {
        Self {
            source,
            date,
            currency,
        }
    }

    /// Storage spelling: `fx_cache_v1_{source}_{YYYYMMDD}[_{CODE}]`.
    pub fn storage_key(&self) -> String {
        match self.currency {
            Some(currency) => format!(
                "{KEY_PREFIX}_{}_{}_{}",
                self.source,
                self.date.compact(),
                currency.code()
            ),
            None => format!("{KEY_PREFIX}_{}_{}", self.source, self.date.compact()),
        }
    }
}

/// One cached fetch result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub records: Vec<RateRecord>,
    pub fetched_at_ms: i64,
}

impl CacheEntry {
    pub fn new(records: Vec<RateRecord>, fetched_at_ms: i64) -> Self {
        Self {
            records,
            fetched_at_ms,
        }
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.fetched_at_ms).max(0)
    }
}

/// Unix epoch milliseconds for cache timestamps.
pub fn epoch_millis(now: OffsetDateTime) -> i64 {
    (now.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Shared cache store, optionally persisted to a JSON file.
///
/// The in-memory map is the source of truth; the file is rewritten after
/// each mutation on a best-effort basis, and a corrupt file at open time
/// degrades to an empty store rather than an error.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<tokio::sync::RwLock<HashMap<String, CacheEntry>>>,
    persist_path: Option<PathBuf>,
}

impl CacheStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            persist_path: None,
        }
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, CacheEntry>>(&bytes) {
                Ok(map) => map,
                Err(error) => {
                    warn!("cache file {} is unreadable, starting empty: {error}", path.display());
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            inner: Arc::new(tokio::sync::RwLock::new(map)),
            persist_path: Some(path),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let store = self.inner.read().await;
        store.get(&key.storage_key()).cloned()
    }

    /// Stores a fetch result. Empty record sets are never written; an
    /// empty upstream answer is not a fact worth pinning.
    pub async fn put(&self, key: &CacheKey, entry: CacheEntry) {
        if entry.records.is_empty() {
            return;
        }

        let mut store = self.inner.write().await;
        store.insert(key.storage_key(), entry);
        self.flush(&store);
    }

    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.len()
    }

    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.clear();
        self.flush(&store);
    }

    fn flush(&self, store: &HashMap<String, CacheEntry>) {
        let Some(path) = &self.persist_path else {
            return;
        };

        match serde_json::to_vec_pretty(store) {
            Ok(bytes) => {
                if let Err(error) = std::fs::write(path, bytes) {
                    warn!("failed to persist cache to {}: {error}", path.display());
                }
            }
            Err(error) => warn!("failed to serialize cache: {error}"),
        }
    }
}
