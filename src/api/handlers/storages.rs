use axum::{extract::State, Json};
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::extract::{ApiPath, ValidJson};
use crate::api::server::AppState;
use crate::db;
use crate::domain::storages;
use crate::models::{DetailResponse, NewStorage, Storage, StorageCreated};

#[tracing::instrument(skip(state))]
pub async fn list_storages_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Storage>>> {
    let mut uow = state.db.begin().await?;
    let result = storages::list_storages(uow.as_mut()).await;
    Ok(Json(db::finish(uow, result).await?))
}

#[tracing::instrument(skip(state))]
pub async fn get_storage_handler(
    ApiPath(storage_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<Storage>> {
    let mut uow = state.db.begin().await?;
    let result = storages::get_storage(uow.as_mut(), storage_id).await;
    Ok(Json(db::finish(uow, result).await?))
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_storage_handler(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewStorage>,
) -> ApiResult<Json<StorageCreated>> {
    let mut uow = state.db.begin().await?;
    let result = storages::create_storage(uow.as_mut(), &payload).await;
    let storage_id = db::finish(uow, result).await?;

    info!(storage_id, "Storage created");
    Ok(Json(StorageCreated { storage_id }))
}

#[tracing::instrument(skip(state, payload))]
pub async fn update_storage_handler(
    ApiPath(storage_id): ApiPath<i32>,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewStorage>,
) -> ApiResult<Json<DetailResponse>> {
    let mut uow = state.db.begin().await?;
    let result = storages::update_storage(uow.as_mut(), storage_id, &payload).await;
    db::finish(uow, result).await?;

    Ok(Json(DetailResponse::new("Storage updated successfully")))
}

#[tracing::instrument(skip(state))]
pub async fn delete_storage_handler(
    ApiPath(storage_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<DetailResponse>> {
    let mut uow = state.db.begin().await?;
    let result = storages::delete_storage(uow.as_mut(), storage_id).await;
    db::finish(uow, result).await?;

    Ok(Json(DetailResponse::new("Storage deleted successfully")))
}
