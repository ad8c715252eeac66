use super::price::Price;
use super::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Volatile, TTL-aware storage shared by the fetcher and the request path.
///
/// Transaction entries expire; price entries never do. Implementations must be
/// safe for concurrent use without any locking by the caller.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn set_transaction(&self, key: &str, transaction: Transaction, ttl: Duration);
    async fn get_transaction(&self, key: &str) -> Option<Transaction>;
    /// All live transactions whose key contains `pattern`, in no particular order.
    async fn transactions(&self, pattern: &str) -> Vec<Transaction>;
    async fn delete_transaction(&self, key: &str);

    async fn set_price(&self, key: &str, price: Price);
    async fn get_price(&self, key: &str) -> Option<Price>;
    async fn prices(&self) -> Vec<Price>;
    async fn delete_price(&self, key: &str);

    async fn clear(&self);
}

/// One external payment source.
///
/// Adapters map their native records into [`Transaction`], including status
/// normalization and minor to major unit conversion.
#[async_trait]
pub trait TransactionProvider: Send + Sync {
    async fn latest_transactions(&self, limit: usize) -> Result<Vec<Transaction>>;
    async fn transaction_by_id(&self, id: &str) -> Result<Transaction>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn get_transactions(&self, limit: usize) -> Result<Vec<Transaction>>;
    async fn get_transaction_by_id(&self, id: &str) -> Result<Transaction>;
    async fn refresh_cache(&self) -> Result<()>;
}

pub type CacheHandle = Arc<dyn Cache>;
pub type ProviderHandle = Arc<dyn TransactionProvider>;
pub type RepositoryHandle = Arc<dyn TransactionRepository>;
