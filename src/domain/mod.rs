// Domain layer - business logic with no HTTP concerns.
// Operations run against a caller-scoped unit of work; the caller commits
// or rolls back once the operation returns.

pub mod organizations;
pub mod placement;
pub mod prices;
pub mod storages;
pub mod transfer;

use crate::db::DatabaseError;
use crate::models::WasteType;

/// Business-rule violation, reported to the client verbatim
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("Amount must be greater than zero.")]
    NonPositiveAmount,

    #[error("Storage {storage_id} does not support waste type {waste_type}.")]
    UnsupportedWasteType { storage_id: i32, waste_type: WasteType },

    #[error("Storage {storage_id} does not have sufficient capacity for {amount} of waste type {waste_type}.")]
    InsufficientCapacity {
        storage_id: i32,
        waste_type: WasteType,
        amount: i32,
    },

    #[error("Organization {organization_id} does not generate waste type {waste_type}.")]
    WasteTypeNotGenerated {
        organization_id: i32,
        waste_type: WasteType,
    },

    #[error("Organization {organization_id} has insufficient waste of type {waste_type}. Available: {available}, Requested: {requested}.")]
    InsufficientWaste {
        organization_id: i32,
        waste_type: WasteType,
        available: i32,
        requested: i32,
    },

    #[error("Organization {organization_id} cannot hold {amount} more of waste type {waste_type}.")]
    WasteAmountOverflow {
        organization_id: i32,
        waste_type: WasteType,
        amount: i32,
    },
}

// Domain error type - no HTTP concerns
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid data: {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DatabaseError> for DomainError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(msg) => DomainError::NotFound(msg),
            DatabaseError::Conflict(msg) => DomainError::Conflict(msg),
            DatabaseError::InvalidData(msg) => DomainError::Invalid(msg),
            other => DomainError::Database(other.to_string()),
        }
    }
}

pub use placement::{distance, has_sufficient_capacity, rank_available_storages};
pub use transfer::{transfer_waste, TransferOrder};
