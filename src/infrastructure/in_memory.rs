use crate::domain::ports::Cache;
use crate::domain::price::Price;
use crate::domain::transaction::Transaction;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const TRANSACTION_PREFIX: &str = "transaction:";
pub const PRICE_PREFIX: &str = "price:";

/// How long an entry stays visible after it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    Never,
    After(Duration),
}

impl Expiration {
    fn deadline(self, now: Instant) -> Option<Instant> {
        match self {
            Self::Never => None,
            // A ttl too large to represent never expires in practice.
            Self::After(ttl) => now.checked_add(ttl),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Transaction(Transaction),
    Price(Price),
}

#[derive(Debug, Clone)]
struct Entry {
    value: CacheValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// A thread-safe in-memory key/value cache with per-entry expiry.
///
/// Uses `Arc<RwLock<HashMap<String, Entry>>>` so clones share the same store.
/// Expired entries are hidden from reads immediately and physically removed by
/// [`InMemoryCache::purge_expired`], which the janitor task calls periodically.
#[derive(Default, Clone)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryCache {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, key: impl Into<String>, value: CacheValue, expiration: Expiration) {
        let entry = Entry {
            value,
            expires_at: expiration.deadline(Instant::now()),
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.into(), entry);
    }

    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// Returns every live value whose key starts with `prefix` and contains
    /// `pattern` (an empty pattern matches everything under the prefix).
    pub async fn list(&self, prefix: &str, pattern: &str) -> Vec<CacheValue> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|(key, entry)| {
                key.starts_with(prefix)
                    && (pattern.is_empty() || key.contains(pattern))
                    && !entry.is_expired(now)
            })
            .map(|(_, entry)| entry.value.clone())
            .collect()
    }

    pub async fn delete(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    /// Drops expired entries and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Spawns a task that purges expired entries every `interval` until
    /// `shutdown` is cancelled.
    pub fn spawn_janitor(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired().await;
                        if removed > 0 {
                            debug!(removed, "Evicted expired cache entries");
                        }
                    }
                }
            }
        })
    }
}

fn transaction_key(key: &str) -> String {
    format!("{TRANSACTION_PREFIX}{key}")
}

fn price_key(key: &str) -> String {
    format!("{PRICE_PREFIX}{key}")
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn set_transaction(&self, key: &str, transaction: Transaction, ttl: Duration) {
        self.set(
            transaction_key(key),
            CacheValue::Transaction(transaction),
            Expiration::After(ttl),
        )
        .await;
    }

    async fn get_transaction(&self, key: &str) -> Option<Transaction> {
        match self.get(&transaction_key(key)).await {
            Some(CacheValue::Transaction(transaction)) => Some(transaction),
            _ => None,
        }
    }

    async fn transactions(&self, pattern: &str) -> Vec<Transaction> {
        self.list(TRANSACTION_PREFIX, pattern)
            .await
            .into_iter()
            .filter_map(|value| match value {
                CacheValue::Transaction(transaction) => Some(transaction),
                CacheValue::Price(_) => None,
            })
            .collect()
    }

    async fn delete_transaction(&self, key: &str) {
        self.delete(&transaction_key(key)).await;
    }

    async fn set_price(&self, key: &str, price: Price) {
        self.set(price_key(key), CacheValue::Price(price), Expiration::Never)
            .await;
    }

    async fn get_price(&self, key: &str) -> Option<Price> {
        match self.get(&price_key(key)).await {
            Some(CacheValue::Price(price)) => Some(price),
            _ => None,
        }
    }

    async fn prices(&self) -> Vec<Price> {
        self.list(PRICE_PREFIX, "")
            .await
            .into_iter()
            .filter_map(|value| match value {
                CacheValue::Price(price) => Some(price),
                CacheValue::Transaction(_) => None,
            })
            .collect()
    }

    async fn delete_price(&self, key: &str) {
        self.delete(&price_key(key)).await;
    }

    async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }
}
