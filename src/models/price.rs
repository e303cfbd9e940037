use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Price observation for a ticker such as `btc_usd`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CryptoPrice {
    pub id: i32,
    pub ticker: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Unix timestamp in seconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCryptoPrice {
    pub ticker: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub timestamp: i64,
}

impl NewCryptoPrice {
    pub fn into_price(self, id: i32) -> CryptoPrice {
        CryptoPrice {
            id,
            ticker: self.ticker,
            price: self.price,
            timestamp: self.timestamp,
        }
    }
}
