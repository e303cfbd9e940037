use async_trait::async_trait;
use tracing::info;

use super::PgUnitOfWork;
use crate::db::errors::{DatabaseError, Result};
use crate::db::repository::PriceRepository;
use crate::models::{CryptoPrice, NewCryptoPrice};

#[async_trait]
impl PriceRepository for PgUnitOfWork {
    #[tracing::instrument(skip(self))]
    async fn prices_by_ticker(&mut self, ticker: &str) -> Result<Vec<CryptoPrice>> {
        let prices = sqlx::query_as::<_, CryptoPrice>(
            r#"
            SELECT id, ticker, price, "timestamp"
            FROM crypto_prices
            WHERE ticker = $1
            ORDER BY "timestamp", id
            "#,
        )
        .bind(ticker)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(prices)
    }

    #[tracing::instrument(skip(self))]
    async fn latest_price(&mut self, ticker: &str) -> Result<Option<CryptoPrice>> {
        let price = sqlx::query_as::<_, CryptoPrice>(
            r#"
            SELECT id, ticker, price, "timestamp"
            FROM crypto_prices
            WHERE ticker = $1
            ORDER BY "timestamp" DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(ticker)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(price)
    }

    #[tracing::instrument(skip(self))]
    async fn prices_between(
        &mut self,
        ticker: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<CryptoPrice>> {
        let prices = sqlx::query_as::<_, CryptoPrice>(
            r#"
            SELECT id, ticker, price, "timestamp"
            FROM crypto_prices
            WHERE ticker = $1
                AND ($2::BIGINT IS NULL OR "timestamp" >= $2)
                AND ($3::BIGINT IS NULL OR "timestamp" <= $3)
            ORDER BY "timestamp", id
            "#,
        )
        .bind(ticker)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(prices)
    }

    #[tracing::instrument(skip(self, price), fields(ticker = %price.ticker))]
    async fn insert_price(&mut self, price: &NewCryptoPrice) -> Result<i32> {
        let price_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO crypto_prices (ticker, price, "timestamp")
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&price.ticker)
        .bind(price.price)
        .bind(price.timestamp)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "crypto price"))?;

        info!("Recorded price {} for {}", price_id, price.ticker);
        Ok(price_id)
    }
}
