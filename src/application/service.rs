use super::pricing::PriceMatcher;
use crate::domain::ports::RepositoryHandle;
use crate::domain::transaction::Transaction;
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry point for callers: repository reads with product enrichment applied.
#[derive(Clone)]
pub struct TransactionService {
    repository: RepositoryHandle,
    prices: Option<Arc<PriceMatcher>>,
}

impl TransactionService {
    pub fn new(repository: RepositoryHandle, prices: Option<Arc<PriceMatcher>>) -> Self {
        if prices.is_none() {
            warn!("Price list not available, transactions will not be enriched");
        }
        Self { repository, prices }
    }

    pub async fn get_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        let transactions = self.repository.get_transactions(limit).await?;
        Ok(transactions.into_iter().map(|tx| self.enrich(tx)).collect())
    }

    pub async fn get_transaction_by_id(&self, id: &str) -> Result<Transaction> {
        let transaction = self.repository.get_transaction_by_id(id).await?;
        Ok(self.enrich(transaction))
    }

    pub async fn refresh_cache(&self) -> Result<()> {
        self.repository.refresh_cache().await
    }

    /// Attaches the best-matching product, if any. Takes the transaction by
    /// value: the repository hands out copies, never the cached instance.
    fn enrich(&self, mut transaction: Transaction) -> Transaction {
        let Some(prices) = &self.prices else {
            return transaction;
        };

        match prices.find_best_match(transaction.amount, &transaction.description) {
            Some(matched) => {
                debug!(
                    transaction_id = %transaction.id,
                    matched_product = %matched.product,
                    product_price = %matched.price,
                    transaction_amount = %transaction.amount,
                    "Enriched transaction with product information"
                );
                transaction.product = Some(matched.product.clone());
                transaction.product_price = Some(matched.price);
            }
            None => {
                debug!(
                    transaction_id = %transaction.id,
                    amount = %transaction.amount,
                    description = %transaction.description,
                    "No product match found for transaction"
                );
            }
        }
        transaction
    }
}
