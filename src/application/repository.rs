use super::{CACHE_TTL, PROVIDER_FETCH_LIMIT, Providers};
use crate::domain::ports::{CacheHandle, TransactionRepository};
use crate::domain::transaction::Transaction;
use crate::error::{AggregatorError, Result};
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

pub const TRANSACTION_LIMIT_MIN: usize = 1;
pub const TRANSACTION_LIMIT_DEFAULT: usize = 25;
pub const TRANSACTION_LIMIT_MAX: usize = 1000;

/// Out-of-range limits are defaulted rather than rejected.
pub fn clamp_limit(limit: usize) -> usize {
    if limit < TRANSACTION_LIMIT_MIN {
        TRANSACTION_LIMIT_DEFAULT
    } else {
        limit.min(TRANSACTION_LIMIT_MAX)
    }
}

/// Serves transactions from the cache, going to the providers only when the
/// cache cannot answer.
///
/// The background fetcher is expected to keep the cache populated. A completely
/// empty cache triggers one synchronous refresh so the first caller after a cold
/// start still gets data.
pub struct CachedTransactionRepository {
    cache: CacheHandle,
    providers: Providers,
}

impl CachedTransactionRepository {
    pub fn new(cache: CacheHandle, providers: Providers) -> Self {
        Self { cache, providers }
    }

    async fn newest_first(&self) -> Vec<Transaction> {
        let mut transactions = self.cache.transactions("").await;
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        transactions
    }
}

#[async_trait]
impl TransactionRepository for CachedTransactionRepository {
    async fn get_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        let limit = clamp_limit(limit);

        let mut cached = self.newest_first().await;
        if cached.len() >= limit {
            cached.truncate(limit);
            return Ok(cached);
        }

        if !cached.is_empty() {
            info!(
                available = cached.len(),
                requested = limit,
                "Returning partial transaction data from cache"
            );
            return Ok(cached);
        }

        warn!("Cache is empty, performing one-time refresh as fallback");
        if let Err(e) = self.refresh_cache().await {
            error!(error = %e, "Failed to refresh cache as fallback");
            return Err(AggregatorError::RefreshFailed(Box::new(e)));
        }

        let mut cached = self.newest_first().await;
        cached.truncate(limit);
        Ok(cached)
    }

    async fn get_transaction_by_id(&self, id: &str) -> Result<Transaction> {
        if let Some(transaction) = self.cache.get_transaction(id).await {
            return Ok(transaction);
        }

        for (source, provider) in self.providers.iter() {
            match provider.transaction_by_id(id).await {
                Ok(transaction) => {
                    self.cache
                        .set_transaction(&transaction.external_id, transaction.clone(), CACHE_TTL)
                        .await;
                    return Ok(transaction);
                }
                Err(e) => {
                    debug!(provider = %source, id, error = %e, "Transaction not found in provider");
                }
            }
        }

        Err(AggregatorError::NotFound(id.to_string()))
    }

    async fn refresh_cache(&self) -> Result<()> {
        if self.providers.is_empty() {
            return Err(AggregatorError::NoProviders);
        }

        let mut all_transactions = Vec::new();
        for (source, provider) in self.providers.iter() {
            match provider.latest_transactions(PROVIDER_FETCH_LIMIT).await {
                Ok(transactions) => {
                    info!(provider = %source, count = transactions.len(), "Fetched transactions");
                    all_transactions.extend(transactions);
                }
                Err(e) => {
                    error!(provider = %source, error = %e, "Failed to fetch transactions");
                }
            }
        }

        let total = all_transactions.len();
        for transaction in all_transactions {
            let key = transaction.external_id.clone();
            self.cache.set_transaction(&key, transaction, CACHE_TTL).await;
        }

        info!(total_transactions = total, "Refreshed transaction cache");
        Ok(())
    }
}
