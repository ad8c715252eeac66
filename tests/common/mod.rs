#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use payhub::domain::ports::TransactionProvider;
use payhub::domain::status::TransactionStatus;
use payhub::domain::transaction::{PaymentSource, Transaction};
use payhub::error::{AggregatorError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn transaction(
    source: PaymentSource,
    external_id: &str,
    amount: Decimal,
    description: &str,
    created_offset_secs: i64,
) -> Transaction {
    Transaction {
        id: source.internal_id(external_id),
        external_id: external_id.to_string(),
        source,
        amount,
        currency: "NOK".to_string(),
        status: TransactionStatus::Succeeded,
        created_at: timestamp(created_offset_secs),
        customer_id: None,
        description: description.to_string(),
        payment_method: "card".to_string(),
        receipt_url: None,
        metadata: HashMap::new(),
        provider_data: None,
        cached_at: Utc::now(),
        product: None,
        product_price: None,
    }
}

/// Provider double serving a fixed list and counting calls.
pub struct FakeProvider {
    pub source: PaymentSource,
    transactions: Vec<Transaction>,
    fail: AtomicBool,
    delay: Option<Duration>,
    pub latest_calls: AtomicUsize,
    pub by_id_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new(source: PaymentSource, transactions: Vec<Transaction>) -> Self {
        Self {
            source,
            transactions,
            fail: AtomicBool::new(false),
            delay: None,
            latest_calls: AtomicUsize::new(0),
            by_id_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(source: PaymentSource) -> Self {
        let provider = Self::new(source, Vec::new());
        provider.set_failing(true);
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    pub fn by_id_calls(&self) -> usize {
        self.by_id_calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TransactionProvider for FakeProvider {
    async fn latest_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(AggregatorError::upstream(self.source, "service unavailable"));
        }
        Ok(self.transactions.iter().take(limit).cloned().collect())
    }

    async fn transaction_by_id(&self, id: &str) -> Result<Transaction> {
        self.by_id_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(AggregatorError::upstream(self.source, "service unavailable"));
        }
        self.transactions
            .iter()
            .find(|tx| tx.external_id == id)
            .cloned()
            .ok_or_else(|| AggregatorError::NotFound(id.to_string()))
    }
}
