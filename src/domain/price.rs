use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product and its list price, as read from the price list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub product: String,
    pub price: Decimal,
    pub currency: String,
}
