use axum::{extract::State, Json};

use crate::api::error::ApiResult;
use crate::api::extract::{ValidJson, ValidQuery};
use crate::api::server::AppState;
use crate::db;
use crate::domain::prices;
use crate::models::{CryptoPrice, NewCryptoPrice, PriceCreated, PriceHistoryParams, TickerParams};

#[tracing::instrument(skip(state))]
pub async fn prices_by_ticker_handler(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<TickerParams>,
) -> ApiResult<Json<Vec<CryptoPrice>>> {
    let mut uow = state.db.begin().await?;
    let result = prices::prices_by_ticker(uow.as_mut(), &params.ticker).await;
    Ok(Json(db::finish(uow, result).await?))
}

#[tracing::instrument(skip(state))]
pub async fn latest_price_handler(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<TickerParams>,
) -> ApiResult<Json<CryptoPrice>> {
    let mut uow = state.db.begin().await?;
    let result = prices::latest_price(uow.as_mut(), &params.ticker).await;
    Ok(Json(db::finish(uow, result).await?))
}

#[tracing::instrument(skip(state))]
pub async fn price_history_handler(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<PriceHistoryParams>,
) -> ApiResult<Json<Vec<CryptoPrice>>> {
    let mut uow = state.db.begin().await?;
    let result =
        prices::price_history(uow.as_mut(), &params.ticker, params.start_date, params.end_date).await;
    Ok(Json(db::finish(uow, result).await?))
}

#[tracing::instrument(skip(state, payload))]
pub async fn record_price_handler(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewCryptoPrice>,
) -> ApiResult<Json<PriceCreated>> {
    let mut uow = state.db.begin().await?;
    let result = prices::record_price(uow.as_mut(), &payload).await;
    let price_id = db::finish(uow, result).await?;

    Ok(Json(PriceCreated { price_id }))
}
