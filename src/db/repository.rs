// Record store seams. Every operation runs inside the unit of work it is
// called on; nothing is visible to other units of work until `commit`.

use async_trait::async_trait;

use crate::db::errors::Result;
use crate::models::{
    CryptoPrice, NewCryptoPrice, NewOrganization, NewStorage, Organization, Storage, WasteType,
};

#[async_trait]
pub trait OrganizationRepository: Send {
    async fn list_organizations(&mut self) -> Result<Vec<Organization>>;

    async fn get_organization(&mut self, organization_id: i32) -> Result<Option<Organization>>;

    /// Insert the organization with its line items, returning the new id
    async fn create_organization(&mut self, organization: &NewOrganization) -> Result<i32>;

    /// Replace header fields and all line items. `None` when the id is unknown.
    async fn update_organization(
        &mut self,
        organization_id: i32,
        organization: &NewOrganization,
    ) -> Result<Option<i32>>;

    /// Delete the organization and its line items. `None` when the id is unknown.
    async fn delete_organization(&mut self, organization_id: i32) -> Result<Option<i32>>;

    /// Hold the organization row until the unit of work ends
    async fn lock_organization(&mut self, organization_id: i32) -> Result<()>;

    /// Add `amount` to the line item for `waste_type`, creating it when absent
    async fn increment_organization_waste(
        &mut self,
        organization_id: i32,
        waste_type: WasteType,
        amount: i32,
    ) -> Result<()>;

    /// Subtract `amount` from the line item for `waste_type`.
    ///
    /// Fails with [`DatabaseError::Conflict`](crate::db::DatabaseError::Conflict) when the
    /// line item is missing or holds less than `amount`.
    async fn decrement_organization_waste(
        &mut self,
        organization_id: i32,
        waste_type: WasteType,
        amount: i32,
    ) -> Result<()>;
}

#[async_trait]
pub trait StorageRepository: Send {
    async fn list_storages(&mut self) -> Result<Vec<Storage>>;

    async fn get_storage(&mut self, storage_id: i32) -> Result<Option<Storage>>;

    async fn create_storage(&mut self, storage: &NewStorage) -> Result<i32>;

    async fn update_storage(&mut self, storage_id: i32, storage: &NewStorage) -> Result<Option<i32>>;

    async fn delete_storage(&mut self, storage_id: i32) -> Result<Option<i32>>;

    async fn lock_storage(&mut self, storage_id: i32) -> Result<()>;

    /// Add `amount` to the current level for `waste_type`, creating it when absent
    async fn increment_storage_level(
        &mut self,
        storage_id: i32,
        waste_type: WasteType,
        amount: i32,
    ) -> Result<()>;
}

#[async_trait]
pub trait PriceRepository: Send {
    /// All observations for `ticker`, oldest first
    async fn prices_by_ticker(&mut self, ticker: &str) -> Result<Vec<CryptoPrice>>;

    async fn latest_price(&mut self, ticker: &str) -> Result<Option<CryptoPrice>>;

    /// Observations with `start <= timestamp <= end`, open bounds when `None`
    async fn prices_between(
        &mut self,
        ticker: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<CryptoPrice>>;

    async fn insert_price(&mut self, price: &NewCryptoPrice) -> Result<i32>;
}

/// One transaction over all repositories. Dropping it without `commit` discards its writes.
#[async_trait]
pub trait UnitOfWork: OrganizationRepository + StorageRepository + PriceRepository + Send {
    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Source of units of work, shared by all requests
#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
}
