use tracing::info;

use super::placement::{distance, rank_available_storages};
use super::{DomainError, Rejection};
use crate::db::UnitOfWork;
use crate::models::{AvailableStorage, NewOrganization, Organization, WasteType};

fn organization_not_found() -> DomainError {
    DomainError::NotFound("Organization not found".to_string())
}

#[tracing::instrument(skip(uow))]
pub async fn list_organizations(uow: &mut dyn UnitOfWork) -> Result<Vec<Organization>, DomainError> {
    Ok(uow.list_organizations().await?)
}

#[tracing::instrument(skip(uow))]
pub async fn get_organization(
    uow: &mut dyn UnitOfWork,
    organization_id: i32,
) -> Result<Organization, DomainError> {
    uow.get_organization(organization_id).await?.ok_or_else(|| {
        DomainError::NotFound("Data not found for specified organization_id.".to_string())
    })
}

#[tracing::instrument(skip(uow, organization), fields(name = %organization.name))]
pub async fn create_organization(
    uow: &mut dyn UnitOfWork,
    organization: &NewOrganization,
) -> Result<i32, DomainError> {
    Ok(uow.create_organization(organization).await?)
}

#[tracing::instrument(skip(uow, organization))]
pub async fn update_organization(
    uow: &mut dyn UnitOfWork,
    organization_id: i32,
    organization: &NewOrganization,
) -> Result<i32, DomainError> {
    uow.update_organization(organization_id, organization)
        .await?
        .ok_or_else(organization_not_found)
}

#[tracing::instrument(skip(uow))]
pub async fn delete_organization(
    uow: &mut dyn UnitOfWork,
    organization_id: i32,
) -> Result<i32, DomainError> {
    uow.delete_organization(organization_id)
        .await?
        .ok_or_else(organization_not_found)
}

/// Record newly generated waste, declaring the line item if the organization had none
#[tracing::instrument(skip(uow))]
pub async fn generate_waste(
    uow: &mut dyn UnitOfWork,
    organization_id: i32,
    waste_type: WasteType,
    amount: i32,
) -> Result<(), DomainError> {
    if amount <= 0 {
        return Err(Rejection::NonPositiveAmount.into());
    }

    uow.lock_organization(organization_id).await?;
    let organization = uow
        .get_organization(organization_id)
        .await?
        .ok_or_else(organization_not_found)?;

    let current = organization.waste_amount(waste_type).unwrap_or(0);
    if current.checked_add(amount).is_none() {
        return Err(Rejection::WasteAmountOverflow {
            organization_id,
            waste_type,
            amount,
        }
        .into());
    }

    uow.increment_organization_waste(organization_id, waste_type, amount)
        .await?;

    info!("Generated waste");
    Ok(())
}

#[tracing::instrument(skip(uow))]
pub async fn distance_to_storage(
    uow: &mut dyn UnitOfWork,
    organization_id: i32,
    storage_id: i32,
) -> Result<f64, DomainError> {
    let invalid = || DomainError::NotFound("Invalid organization or storage".to_string());

    let organization = uow.get_organization(organization_id).await?.ok_or_else(invalid)?;
    let storage = uow.get_storage(storage_id).await?.ok_or_else(invalid)?;

    Ok(distance(organization.location(), storage.location()))
}

/// Storages that can take all of the organization's waste, nearest first
#[tracing::instrument(skip(uow))]
pub async fn available_storages(
    uow: &mut dyn UnitOfWork,
    organization_id: i32,
) -> Result<Vec<AvailableStorage>, DomainError> {
    let organization = uow
        .get_organization(organization_id)
        .await?
        .ok_or_else(organization_not_found)?;

    let storages = uow.list_storages().await?;
    let ranked = rank_available_storages(&organization, storages);

    info!(count = ranked.len(), "Ranked available storages");
    Ok(ranked)
}
