use serde::{Deserialize, Serialize};

use super::waste::WasteType;
use super::Location;

/// Ceiling for one waste type at a storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageCapacity {
    pub waste_type: WasteType,
    pub capacity: i32,
}

/// Running total for one waste type at a storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageCurrentLevel {
    pub waste_type: WasteType,
    pub current_amount: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub id: i32,
    pub name: String,
    pub location_x: f64,
    pub location_y: f64,
    pub capacities: Vec<StorageCapacity>,
    pub current_levels: Vec<StorageCurrentLevel>,
}

impl Storage {
    pub fn location(&self) -> Location {
        Location::new(self.location_x, self.location_y)
    }

    /// Declared capacity for `waste_type`, `None` when the storage does not accept it
    pub fn capacity_for(&self, waste_type: WasteType) -> Option<i32> {
        self.capacities
            .iter()
            .find(|c| c.waste_type == waste_type)
            .map(|c| c.capacity)
    }

    /// Current level for `waste_type`, zero when nothing is stored yet
    pub fn current_level(&self, waste_type: WasteType) -> i32 {
        self.current_levels
            .iter()
            .find(|l| l.waste_type == waste_type)
            .map(|l| l.current_amount)
            .unwrap_or(0)
    }

    pub fn supports(&self, waste_type: WasteType) -> bool {
        self.capacity_for(waste_type).is_some()
    }
}

/// Body of storage create and full-replace update requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStorage {
    pub name: String,
    pub location_x: f64,
    pub location_y: f64,
    pub capacities: Vec<StorageCapacity>,
    pub current_levels: Vec<StorageCurrentLevel>,
}

impl NewStorage {
    pub fn into_storage(self, id: i32) -> Storage {
        Storage {
            id,
            name: self.name,
            location_x: self.location_x,
            location_y: self.location_y,
            capacities: self.capacities,
            current_levels: self.current_levels,
        }
    }
}
