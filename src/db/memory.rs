// In-process record store. A unit of work holds the store lock for its whole
// lifetime and mutates a private copy, so transactions are serialised and a
// dropped unit of work leaves no trace.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db::errors::{DatabaseError, Result};
use crate::db::repository::{
    Database, OrganizationRepository, PriceRepository, StorageRepository, UnitOfWork,
};
use crate::models::{
    CryptoPrice, NewCryptoPrice, NewOrganization, NewStorage, Organization, OrganizationWaste,
    Storage, StorageCurrentLevel, WasteType,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    organizations: BTreeMap<i32, Organization>,
    storages: BTreeMap<i32, Storage>,
    prices: Vec<CryptoPrice>,
    next_organization_id: i32,
    next_storage_id: i32,
    next_price_id: i32,
}

impl MemoryState {
    fn allocate(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }

    fn storage_name_taken(&self, name: &str, except: Option<i32>) -> bool {
        self.storages
            .values()
            .any(|s| s.name == name && Some(s.id) != except)
    }
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
    #[cfg(test)]
    fail_level_writes: bool,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose storage level increments always fail, for exercising rollback
    #[cfg(test)]
    pub(crate) fn with_failing_level_writes() -> Self {
        Self {
            fail_level_writes: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            working,
            #[cfg(test)]
            fail_level_writes: self.fail_level_writes,
        }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    #[cfg(test)]
    fail_level_writes: bool,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryUnitOfWork { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl OrganizationRepository for MemoryUnitOfWork {
    async fn list_organizations(&mut self) -> Result<Vec<Organization>> {
        Ok(self.working.organizations.values().cloned().collect())
    }

    async fn get_organization(&mut self, organization_id: i32) -> Result<Option<Organization>> {
        Ok(self.working.organizations.get(&organization_id).cloned())
    }

    async fn create_organization(&mut self, organization: &NewOrganization) -> Result<i32> {
        let id = MemoryState::allocate(&mut self.working.next_organization_id);
        self.working
            .organizations
            .insert(id, organization.clone().into_organization(id));
        Ok(id)
    }

    async fn update_organization(
        &mut self,
        organization_id: i32,
        organization: &NewOrganization,
    ) -> Result<Option<i32>> {
        match self.working.organizations.get_mut(&organization_id) {
            Some(existing) => {
                *existing = organization.clone().into_organization(organization_id);
                Ok(Some(organization_id))
            }
            None => Ok(None),
        }
    }

    async fn delete_organization(&mut self, organization_id: i32) -> Result<Option<i32>> {
        Ok(self
            .working
            .organizations
            .remove(&organization_id)
            .map(|o| o.id))
    }

    async fn lock_organization(&mut self, _organization_id: i32) -> Result<()> {
        Ok(())
    }

    async fn increment_organization_waste(
        &mut self,
        organization_id: i32,
        waste_type: WasteType,
        amount: i32,
    ) -> Result<()> {
        let organization = self
            .working
            .organizations
            .get_mut(&organization_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("organization {}", organization_id)))?;

        match organization
            .generated_waste
            .iter_mut()
            .find(|w| w.waste_type == waste_type)
        {
            Some(item) => {
                item.amount = item.amount.checked_add(amount).ok_or_else(|| {
                    DatabaseError::InvalidData(format!("{} amount overflow", waste_type))
                })?;
            }
            None => organization
                .generated_waste
                .push(OrganizationWaste { waste_type, amount }),
        }
        Ok(())
    }

    async fn decrement_organization_waste(
        &mut self,
        organization_id: i32,
        waste_type: WasteType,
        amount: i32,
    ) -> Result<()> {
        let item = self
            .working
            .organizations
            .get_mut(&organization_id)
            .and_then(|o| o.generated_waste.iter_mut().find(|w| w.waste_type == waste_type))
            .filter(|w| w.amount >= amount)
            .ok_or_else(|| {
                DatabaseError::Conflict(format!(
                    "organization {} holds less than {} of {}",
                    organization_id, amount, waste_type
                ))
            })?;

        item.amount -= amount;
        Ok(())
    }
}

#[async_trait]
impl StorageRepository for MemoryUnitOfWork {
    async fn list_storages(&mut self) -> Result<Vec<Storage>> {
        Ok(self.working.storages.values().cloned().collect())
    }

    async fn get_storage(&mut self, storage_id: i32) -> Result<Option<Storage>> {
        Ok(self.working.storages.get(&storage_id).cloned())
    }

    async fn create_storage(&mut self, storage: &NewStorage) -> Result<i32> {
        if self.working.storage_name_taken(&storage.name, None) {
            return Err(DatabaseError::Conflict("storage name: duplicate value".to_string()));
        }
        let id = MemoryState::allocate(&mut self.working.next_storage_id);
        self.working
            .storages
            .insert(id, storage.clone().into_storage(id));
        Ok(id)
    }

    async fn update_storage(&mut self, storage_id: i32, storage: &NewStorage) -> Result<Option<i32>> {
        if !self.working.storages.contains_key(&storage_id) {
            return Ok(None);
        }
        if self.working.storage_name_taken(&storage.name, Some(storage_id)) {
            return Err(DatabaseError::Conflict("storage name: duplicate value".to_string()));
        }
        self.working
            .storages
            .insert(storage_id, storage.clone().into_storage(storage_id));
        Ok(Some(storage_id))
    }

    async fn delete_storage(&mut self, storage_id: i32) -> Result<Option<i32>> {
        Ok(self.working.storages.remove(&storage_id).map(|s| s.id))
    }

    async fn lock_storage(&mut self, _storage_id: i32) -> Result<()> {
        Ok(())
    }

    async fn increment_storage_level(
        &mut self,
        storage_id: i32,
        waste_type: WasteType,
        amount: i32,
    ) -> Result<()> {
        #[cfg(test)]
        if self.fail_level_writes {
            return Err(DatabaseError::TransactionError("injected write failure".to_string()));
        }

        let storage = self
            .working
            .storages
            .get_mut(&storage_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("storage {}", storage_id)))?;

        match storage
            .current_levels
            .iter_mut()
            .find(|l| l.waste_type == waste_type)
        {
            Some(level) => {
                level.current_amount = level.current_amount.checked_add(amount).ok_or_else(|| {
                    DatabaseError::InvalidData(format!("{} level overflow", waste_type))
                })?;
            }
            None => storage.current_levels.push(StorageCurrentLevel {
                waste_type,
                current_amount: amount,
            }),
        }
        Ok(())
    }
}

#[async_trait]
impl PriceRepository for MemoryUnitOfWork {
    async fn prices_by_ticker(&mut self, ticker: &str) -> Result<Vec<CryptoPrice>> {
        self.prices_between(ticker, None, None).await
    }

    async fn latest_price(&mut self, ticker: &str) -> Result<Option<CryptoPrice>> {
        Ok(self
            .working
            .prices
            .iter()
            .filter(|p| p.ticker == ticker)
            .max_by_key(|p| (p.timestamp, p.id))
            .cloned())
    }

    async fn prices_between(
        &mut self,
        ticker: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<CryptoPrice>> {
        let mut prices: Vec<CryptoPrice> = self
            .working
            .prices
            .iter()
            .filter(|p| p.ticker == ticker)
            .filter(|p| start.map_or(true, |s| p.timestamp >= s))
            .filter(|p| end.map_or(true, |e| p.timestamp <= e))
            .cloned()
            .collect();
        prices.sort_by_key(|p| (p.timestamp, p.id));
        Ok(prices)
    }

    async fn insert_price(&mut self, price: &NewCryptoPrice) -> Result<i32> {
        let id = MemoryState::allocate(&mut self.working.next_price_id);
        self.working.prices.push(price.clone().into_price(id));
        Ok(id)
    }
}
