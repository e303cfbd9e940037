// Organization endpoints. Each handler opens one unit of work, runs a single
// domain operation in it and closes it with `db::finish`.

use axum::{extract::State, Json};
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::extract::{ApiPath, ValidJson, ValidQuery};
use crate::api::server::AppState;
use crate::db;
use crate::domain::{self, organizations, TransferOrder};
use crate::models::{
    AvailableStorage, DeleteOrganizationParams, DetailResponse, DistanceResponse,
    GenerateWasteParams, NewOrganization, Organization, OrganizationCreated, TransferWasteRequest,
};

#[tracing::instrument(skip(state))]
pub async fn list_organizations_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Organization>>> {
    let mut uow = state.db.begin().await?;
    let result = organizations::list_organizations(uow.as_mut()).await;
    Ok(Json(db::finish(uow, result).await?))
}

#[tracing::instrument(skip(state))]
pub async fn get_organization_handler(
    ApiPath(organization_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<Organization>> {
    let mut uow = state.db.begin().await?;
    let result = organizations::get_organization(uow.as_mut(), organization_id).await;
    Ok(Json(db::finish(uow, result).await?))
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_organization_handler(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewOrganization>,
) -> ApiResult<Json<OrganizationCreated>> {
    let mut uow = state.db.begin().await?;
    let result = organizations::create_organization(uow.as_mut(), &payload).await;
    let organization_id = db::finish(uow, result).await?;

    info!(organization_id, "Organization created");
    Ok(Json(OrganizationCreated { organization_id }))
}

#[tracing::instrument(skip(state, payload))]
pub async fn update_organization_handler(
    ApiPath(organization_id): ApiPath<i32>,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewOrganization>,
) -> ApiResult<Json<DetailResponse>> {
    let mut uow = state.db.begin().await?;
    let result = organizations::update_organization(uow.as_mut(), organization_id, &payload).await;
    db::finish(uow, result).await?;

    Ok(Json(DetailResponse::new("Organization updated successfully")))
}

#[tracing::instrument(skip(state))]
pub async fn delete_organization_handler(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<DeleteOrganizationParams>,
) -> ApiResult<Json<DetailResponse>> {
    let mut uow = state.db.begin().await?;
    let result = organizations::delete_organization(uow.as_mut(), params.organization_id).await;
    db::finish(uow, result).await?;

    Ok(Json(DetailResponse::new("Organization deleted successfully")))
}

#[tracing::instrument(skip(state))]
pub async fn distance_to_storage_handler(
    ApiPath((organization_id, storage_id)): ApiPath<(i32, i32)>,
    State(state): State<AppState>,
) -> ApiResult<Json<DistanceResponse>> {
    let mut uow = state.db.begin().await?;
    let result = organizations::distance_to_storage(uow.as_mut(), organization_id, storage_id).await;
    let distance = db::finish(uow, result).await?;

    Ok(Json(DistanceResponse { distance }))
}

#[tracing::instrument(skip(state))]
pub async fn available_storages_handler(
    ApiPath(organization_id): ApiPath<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<AvailableStorage>>> {
    let mut uow = state.db.begin().await?;
    let result = organizations::available_storages(uow.as_mut(), organization_id).await;
    Ok(Json(db::finish(uow, result).await?))
}

#[tracing::instrument(skip(state, payload))]
pub async fn transfer_waste_handler(
    ApiPath((organization_id, storage_id)): ApiPath<(i32, i32)>,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<TransferWasteRequest>,
) -> ApiResult<Json<DetailResponse>> {
    let order = TransferOrder {
        organization_id,
        storage_id,
        waste_type: payload.waste_type,
        amount: payload.amount,
    };

    let mut uow = state.db.begin().await?;
    let result = domain::transfer_waste(uow.as_mut(), order).await;
    db::finish(uow, result).await?;

    Ok(Json(DetailResponse::new("Waste transferred successfully.")))
}

#[tracing::instrument(skip(state))]
pub async fn generate_waste_handler(
    ApiPath(organization_id): ApiPath<i32>,
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<GenerateWasteParams>,
) -> ApiResult<Json<DetailResponse>> {
    let GenerateWasteParams { waste_type, amount } = params;

    let mut uow = state.db.begin().await?;
    let result = organizations::generate_waste(uow.as_mut(), organization_id, waste_type, amount).await;
    db::finish(uow, result).await?;

    Ok(Json(DetailResponse::new(format!(
        "Successfully added {} of {} waste to organization {}.",
        amount, waste_type, organization_id
    ))))
}
