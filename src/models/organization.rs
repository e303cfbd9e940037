use serde::{Deserialize, Serialize};

use super::waste::{WasteAmount, WasteType};
use super::Location;

/// One generated-waste line item owned by an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationWaste {
    pub waste_type: WasteType,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i32,
    pub name: String,
    pub location_x: f64,
    pub location_y: f64,
    pub generated_waste: Vec<OrganizationWaste>,
}

impl Organization {
    pub fn location(&self) -> Location {
        Location::new(self.location_x, self.location_y)
    }

    /// Amount currently generated for `waste_type`, `None` when no line item exists
    pub fn waste_amount(&self, waste_type: WasteType) -> Option<i32> {
        self.generated_waste
            .iter()
            .find(|w| w.waste_type == waste_type)
            .map(|w| w.amount)
    }

    /// All generated waste as a demand set for capacity checks
    pub fn demand(&self) -> Vec<WasteAmount> {
        self.generated_waste
            .iter()
            .map(|w| WasteAmount::new(w.waste_type, w.amount))
            .collect()
    }
}

/// Body of organization create and full-replace update requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub location_x: f64,
    pub location_y: f64,
    pub generated_waste: Vec<OrganizationWaste>,
}

impl NewOrganization {
    pub fn into_organization(self, id: i32) -> Organization {
        Organization {
            id,
            name: self.name,
            location_x: self.location_x,
            location_y: self.location_y,
            generated_waste: self.generated_waste,
        }
    }
}
