use chrono::{DateTime, FixedOffset};

use super::DomainError;
use crate::db::UnitOfWork;
use crate::models::{CryptoPrice, NewCryptoPrice};

#[tracing::instrument(skip(uow))]
pub async fn prices_by_ticker(uow: &mut dyn UnitOfWork, ticker: &str) -> Result<Vec<CryptoPrice>, DomainError> {
    Ok(uow.prices_by_ticker(ticker).await?)
}

#[tracing::instrument(skip(uow))]
pub async fn latest_price(uow: &mut dyn UnitOfWork, ticker: &str) -> Result<CryptoPrice, DomainError> {
    uow.latest_price(ticker)
        .await?
        .ok_or_else(|| DomainError::NotFound("Data not found for specified ticker.".to_string()))
}

/// Prices between two instants, compared as unix seconds
#[tracing::instrument(skip(uow))]
pub async fn price_history(
    uow: &mut dyn UnitOfWork,
    ticker: &str,
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
) -> Result<Vec<CryptoPrice>, DomainError> {
    let start = start.map(|d| d.timestamp());
    let end = end.map(|d| d.timestamp());
    Ok(uow.prices_between(ticker, start, end).await?)
}

#[tracing::instrument(skip(uow, price), fields(ticker = %price.ticker))]
pub async fn record_price(uow: &mut dyn UnitOfWork, price: &NewCryptoPrice) -> Result<i32, DomainError> {
    Ok(uow.insert_price(price).await?)
}
