use tracing::{info, warn};

use super::placement::has_sufficient_capacity;
use super::{DomainError, Rejection};
use crate::db::UnitOfWork;
use crate::models::{WasteAmount, WasteType};

/// Move `amount` of `waste_type` from an organization into a storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOrder {
    pub organization_id: i32,
    pub storage_id: i32,
    pub waste_type: WasteType,
    pub amount: i32,
}

/// Validate a transfer and apply it to the unit of work.
///
/// Gates run in a fixed order and the first failing one ends the operation:
/// 1. amount is positive
/// 2. organization exists
/// 3. storage exists
/// 4. storage declares a capacity for the waste type
/// 5. storage has room for the amount
/// 6. organization has a line item for the waste type
/// 7. that line item holds at least the amount
///
/// Then the organization line item is decremented and the storage level
/// incremented. A failure while writing is reported as `Internal`; the caller
/// must roll back the unit of work on any error.
#[tracing::instrument(skip(uow, order), fields(
    organization_id = order.organization_id,
    storage_id = order.storage_id,
    waste_type = %order.waste_type,
    amount = order.amount
))]
pub async fn transfer_waste(uow: &mut dyn UnitOfWork, order: TransferOrder) -> Result<(), DomainError> {
    let TransferOrder {
        organization_id,
        storage_id,
        waste_type,
        amount,
    } = order;

    if amount <= 0 {
        return Err(Rejection::NonPositiveAmount.into());
    }

    // Hold both rows so concurrent transfers cannot interleave between checks and writes
    uow.lock_organization(organization_id).await?;
    uow.lock_storage(storage_id).await?;

    let organization = uow
        .get_organization(organization_id)
        .await?
        .ok_or_else(|| DomainError::NotFound("Organization not found".to_string()))?;

    let storage = uow
        .get_storage(storage_id)
        .await?
        .ok_or_else(|| DomainError::NotFound("Storage not found".to_string()))?;

    if !storage.supports(waste_type) {
        return Err(Rejection::UnsupportedWasteType { storage_id, waste_type }.into());
    }

    if !has_sufficient_capacity(&storage, &[WasteAmount::new(waste_type, amount)]) {
        return Err(Rejection::InsufficientCapacity {
            storage_id,
            waste_type,
            amount,
        }
        .into());
    }

    let available = organization.waste_amount(waste_type).ok_or(Rejection::WasteTypeNotGenerated {
        organization_id,
        waste_type,
    })?;

    if available < amount {
        return Err(Rejection::InsufficientWaste {
            organization_id,
            waste_type,
            available,
            requested: amount,
        }
        .into());
    }

    apply_transfer(uow, order).await.map_err(|e| {
        warn!(error = %e, "Waste transfer write failed");
        DomainError::Internal(format!("Waste transfer failed: {}", e))
    })?;

    info!("Transferred waste");
    Ok(())
}

async fn apply_transfer(uow: &mut dyn UnitOfWork, order: TransferOrder) -> crate::db::Result<()> {
    uow.decrement_organization_waste(order.organization_id, order.waste_type, order.amount)
        .await?;
    uow.increment_storage_level(order.storage_id, order.waste_type, order.amount)
        .await?;
    Ok(())
}
