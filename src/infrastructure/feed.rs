use crate::domain::ports::TransactionProvider;
use crate::domain::status::normalize_status;
use crate::domain::transaction::{PaymentSource, ProviderData, Transaction};
use crate::error::{AggregatorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A record as exported by a provider: amounts in minor units, statuses in the
/// provider's own vocabulary.
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: String,
    amount: i64,
    currency: String,
    status: String,
    created: i64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    receipt_url: Option<String>,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// Provider adapter backed by a JSON export of a provider's transactions.
///
/// The file is re-read on every call so a process writing new exports is
/// picked up by the next poll.
#[derive(Debug, Clone)]
pub struct FeedProvider {
    source: PaymentSource,
    path: PathBuf,
}

impl FeedProvider {
    pub fn new(source: PaymentSource, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }

    pub fn source(&self) -> PaymentSource {
        self.source
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Transaction>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            AggregatorError::upstream(
                self.source,
                format!("failed to read {}: {}", self.path.display(), e),
            )
        })?;
        let records: Vec<serde_json::Value> = serde_json::from_slice(&bytes).map_err(|e| {
            AggregatorError::upstream(self.source, format!("malformed export: {}", e))
        })?;

        records
            .into_iter()
            .map(|payload| self.to_transaction(payload))
            .collect()
    }

    fn to_transaction(&self, payload: serde_json::Value) -> Result<Transaction> {
        let raw: RawRecord = serde_json::from_value(payload.clone()).map_err(|e| {
            AggregatorError::upstream(self.source, format!("malformed record: {}", e))
        })?;
        let created_at = DateTime::<Utc>::from_timestamp(raw.created, 0).ok_or_else(|| {
            AggregatorError::upstream(
                self.source,
                format!("record {} has invalid timestamp {}", raw.id, raw.created),
            )
        })?;

        Ok(Transaction {
            id: self.source.internal_id(&raw.id),
            external_id: raw.id,
            source: self.source,
            amount: Transaction::major_units(raw.amount),
            currency: raw.currency,
            status: normalize_status(&raw.status, self.source.as_str()),
            created_at,
            customer_id: raw.customer,
            description: raw.description.unwrap_or_default(),
            payment_method: raw.payment_method.unwrap_or_default(),
            receipt_url: raw.receipt_url,
            metadata: raw.metadata,
            provider_data: Some(ProviderData {
                source: self.source,
                payload,
            }),
            cached_at: Utc::now(),
            product: None,
            product_price: None,
        })
    }
}

#[async_trait]
impl TransactionProvider for FeedProvider {
    async fn latest_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        let mut transactions = self.load().await?;
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        transactions.truncate(limit);
        Ok(transactions)
    }

    async fn transaction_by_id(&self, id: &str) -> Result<Transaction> {
        self.load()
            .await?
            .into_iter()
            .find(|tx| tx.external_id == id)
            .ok_or_else(|| AggregatorError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::TransactionStatus;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_feed(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    const VIPPS_FEED: &str = r#"[
        {"id": "v-1", "amount": 39000, "currency": "NOK", "status": "CAPTURE", "created": 1700000000,
         "description": "tent 1-2 pers", "metadata": {"site": "12"}},
        {"id": "v-2", "amount": 1450, "currency": "NOK", "status": "RESERVE", "created": 1700000500},
        {"id": "v-3", "amount": 65000, "currency": "NOK", "status": "brand_new", "created": 1699999000,
         "receipt_url": "https://example.com/r/3"}
    ]"#;

    #[tokio::test]
    async fn test_latest_transactions_are_normalized() {
        let file = write_feed(VIPPS_FEED);
        let provider = FeedProvider::new(PaymentSource::Vipps, file.path());

        let txs = provider.latest_transactions(10).await.unwrap();

        assert_eq!(txs.len(), 3);
        // Newest first.
        assert_eq!(txs[0].external_id, "v-2");
        assert_eq!(txs[0].amount, dec!(14.50));
        assert_eq!(txs[0].status, TransactionStatus::Processing);
        assert_eq!(txs[1].id, "vipps_internal_v-1");
        assert_eq!(txs[1].status, TransactionStatus::Succeeded);
        assert_eq!(txs[1].metadata.get("site").map(String::as_str), Some("12"));
        assert_eq!(txs[2].status, TransactionStatus::Unknown);
        assert_eq!(txs[2].receipt_url.as_deref(), Some("https://example.com/r/3"));
        assert_eq!(
            txs[2].provider_data.as_ref().map(|d| d.source),
            Some(PaymentSource::Vipps)
        );
    }

    #[tokio::test]
    async fn test_latest_transactions_respects_limit() {
        let file = write_feed(VIPPS_FEED);
        let provider = FeedProvider::new(PaymentSource::Vipps, file.path());

        let txs = provider.latest_transactions(1).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].external_id, "v-2");
    }

    #[tokio::test]
    async fn test_transaction_by_id() {
        let file = write_feed(VIPPS_FEED);
        let provider = FeedProvider::new(PaymentSource::Vipps, file.path());

        let tx = provider.transaction_by_id("v-3").await.unwrap();
        assert_eq!(tx.amount, dec!(650));

        let missing = provider.transaction_by_id("nope").await;
        assert!(matches!(missing, Err(AggregatorError::NotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn test_unreadable_feed_is_upstream_failure() {
        let provider = FeedProvider::new(PaymentSource::Zettle, "does/not/exist.json");
        let result = provider.latest_transactions(10).await;
        assert!(matches!(
            result,
            Err(AggregatorError::Upstream {
                provider: PaymentSource::Zettle,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_malformed_record_fails_whole_fetch() {
        let file = write_feed(r#"[{"id": "x", "amount": "lots"}]"#);
        let provider = FeedProvider::new(PaymentSource::Stripe, file.path());
        assert!(provider.latest_transactions(10).await.is_err());
    }
}
