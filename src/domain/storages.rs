use super::DomainError;
use crate::db::UnitOfWork;
use crate::models::{NewStorage, Storage};

fn storage_not_found() -> DomainError {
    DomainError::NotFound("Storage not found".to_string())
}

fn name_taken(err: DomainError, name: &str) -> DomainError {
    match err {
        DomainError::Conflict(_) => {
            DomainError::Conflict(format!("Storage with name '{}' already exists", name))
        }
        other => other,
    }
}

#[tracing::instrument(skip(uow))]
pub async fn list_storages(uow: &mut dyn UnitOfWork) -> Result<Vec<Storage>, DomainError> {
    Ok(uow.list_storages().await?)
}

#[tracing::instrument(skip(uow))]
pub async fn get_storage(uow: &mut dyn UnitOfWork, storage_id: i32) -> Result<Storage, DomainError> {
    uow.get_storage(storage_id).await?.ok_or_else(storage_not_found)
}

#[tracing::instrument(skip(uow, storage), fields(name = %storage.name))]
pub async fn create_storage(uow: &mut dyn UnitOfWork, storage: &NewStorage) -> Result<i32, DomainError> {
    uow.create_storage(storage)
        .await
        .map_err(|e| name_taken(e.into(), &storage.name))
}

#[tracing::instrument(skip(uow, storage))]
pub async fn update_storage(
    uow: &mut dyn UnitOfWork,
    storage_id: i32,
    storage: &NewStorage,
) -> Result<i32, DomainError> {
    uow.update_storage(storage_id, storage)
        .await
        .map_err(|e| name_taken(e.into(), &storage.name))?
        .ok_or_else(storage_not_found)
}

#[tracing::instrument(skip(uow))]
pub async fn delete_storage(uow: &mut dyn UnitOfWork, storage_id: i32) -> Result<i32, DomainError> {
    uow.delete_storage(storage_id).await?.ok_or_else(storage_not_found)
}
