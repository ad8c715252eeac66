use crate::domain::transaction::PaymentSource;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid price list: {0}")]
    PriceList(String),
    #[error("Invalid range: minimum {min} is greater than maximum {max}")]
    InvalidRange {
        min: rust_decimal::Decimal,
        max: rust_decimal::Decimal,
    },
    #[error("transaction with ID {0} not found")]
    NotFound(String),
    #[error("{provider} fetch failed: {message}")]
    Upstream {
        provider: PaymentSource,
        message: String,
    },
    #[error("{provider} request timed out")]
    Timeout { provider: PaymentSource },
    #[error("no payment providers configured")]
    NoProviders,
    #[error("no transactions available and failed to refresh cache: {0}")]
    RefreshFailed(#[source] Box<AggregatorError>),
}

impl AggregatorError {
    pub fn upstream(provider: PaymentSource, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
