use super::status::TransactionStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The payment providers transactions are aggregated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSource {
    Stripe,
    Vipps,
    Zettle,
}

impl PaymentSource {
    /// Lookup order used when a transaction must be found across providers.
    pub const ALL: [PaymentSource; 3] = [Self::Stripe, Self::Vipps, Self::Zettle];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Vipps => "vipps",
            Self::Zettle => "zettle",
        }
    }

    /// Builds the globally unique internal id for a provider's transaction.
    pub fn internal_id(&self, external_id: &str) -> String {
        format!("{}_internal_{}", self.as_str(), external_id)
    }
}

impl fmt::Display for PaymentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stripe" => Ok(Self::Stripe),
            "vipps" => Ok(Self::Vipps),
            "zettle" => Ok(Self::Zettle),
            other => Err(format!("unknown payment source '{other}'")),
        }
    }
}

/// Raw provider payload kept alongside the unified fields.
///
/// Only the unified fields take part in sorting and matching; this is carried
/// through untouched for callers that need provider-specific detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderData {
    pub source: PaymentSource,
    pub payload: serde_json::Value,
}

/// A payment normalized from any provider.
///
/// `amount` is always in major currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub external_id: String,
    pub source: PaymentSource,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub description: String,
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_data: Option<ProviderData>,
    pub cached_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_price: Option<Decimal>,
}

impl Transaction {
    /// Converts a provider amount expressed in minor units (cents, øre) into
    /// major units.
    pub fn major_units(minor: i64) -> Decimal {
        Decimal::new(minor, 2)
    }
}
