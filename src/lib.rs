pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod models;

// Re-export commonly used types
pub use models::{
    NewOrganization, NewStorage, Organization, OrganizationWaste, Storage, StorageCapacity,
    StorageCurrentLevel, WasteType,
};

pub use db::{Database, DatabaseError, MemoryDatabase, PgDatabase, UnitOfWork};

pub use domain::{
    distance, has_sufficient_capacity, rank_available_storages, transfer_waste, DomainError,
    Rejection, TransferOrder,
};

pub use config::{Config, StoreBackend};
