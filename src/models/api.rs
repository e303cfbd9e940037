// Request and response payloads of the HTTP API

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::organization::NewOrganization;
use super::price::NewCryptoPrice;
use super::storage::{NewStorage, StorageCapacity, StorageCurrentLevel};
use super::waste::WasteType;

/// Input check run by the request extractors before a handler sees the payload
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Largest accepted coordinate magnitude; keeps every pairwise distance finite
pub const MAX_COORDINATE: f64 = 1e9;

fn check_location(x: f64, y: f64) -> Result<(), String> {
    if !(x.is_finite() && y.is_finite()) {
        return Err("Location coordinates must be finite numbers.".to_string());
    }
    if x.abs() > MAX_COORDINATE || y.abs() > MAX_COORDINATE {
        return Err(format!(
            "Location coordinates must be within +/-{} on each axis.",
            MAX_COORDINATE
        ));
    }
    Ok(())
}

fn check_unique_types<'a>(
    field: &str,
    types: impl IntoIterator<Item = &'a WasteType>,
) -> Result<(), String> {
    let mut seen = HashSet::new();
    for waste_type in types {
        if !seen.insert(*waste_type) {
            return Err(format!("Duplicate waste type {} in {}.", waste_type, field));
        }
    }
    Ok(())
}

fn check_positive_amount(amount: i32) -> Result<(), String> {
    if amount > 0 {
        Ok(())
    } else {
        Err("Amount must be greater than zero.".to_string())
    }
}

impl Validate for NewOrganization {
    fn validate(&self) -> Result<(), String> {
        check_location(self.location_x, self.location_y)?;
        check_unique_types("generated_waste", self.generated_waste.iter().map(|w| &w.waste_type))?;
        if let Some(w) = self.generated_waste.iter().find(|w| w.amount < 0) {
            return Err(format!("Amount of waste type {} must not be negative.", w.waste_type));
        }
        Ok(())
    }
}

impl Validate for NewStorage {
    fn validate(&self) -> Result<(), String> {
        check_location(self.location_x, self.location_y)?;
        check_unique_types("capacities", self.capacities.iter().map(|c| &c.waste_type))?;
        check_unique_types("current_levels", self.current_levels.iter().map(|l| &l.waste_type))?;

        if let Some(c) = self.capacities.iter().find(|c| c.capacity < 0) {
            return Err(format!("Capacity of waste type {} must not be negative.", c.waste_type));
        }

        // Every current level needs a matching capacity it stays within
        for level in &self.current_levels {
            if level.current_amount < 0 {
                return Err(format!(
                    "Current amount of waste type {} must not be negative.",
                    level.waste_type
                ));
            }
            match self.capacities.iter().find(|c| c.waste_type == level.waste_type) {
                None => {
                    return Err(format!(
                        "Current level for waste type {} has no matching capacity.",
                        level.waste_type
                    ))
                }
                Some(c) if level.current_amount > c.capacity => {
                    return Err(format!(
                        "Current amount {} of waste type {} exceeds capacity {}.",
                        level.current_amount, level.waste_type, c.capacity
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Validate for NewCryptoPrice {
    fn validate(&self) -> Result<(), String> {
        if self.ticker.trim().is_empty() {
            return Err("Ticker must not be empty.".to_string());
        }
        if self.price.is_sign_negative() {
            return Err("Price must not be negative.".to_string());
        }
        Ok(())
    }
}

/// Body of `POST /organizations/{id}/storages/{storage_id}/transfer-waste`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferWasteRequest {
    pub waste_type: WasteType,
    pub amount: i32,
}

impl Validate for TransferWasteRequest {
    fn validate(&self) -> Result<(), String> {
        check_positive_amount(self.amount)
    }
}

/// Query of `GET /organizations/{id}/generate_waste`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateWasteParams {
    pub waste_type: WasteType,
    pub amount: i32,
}

impl Validate for GenerateWasteParams {
    fn validate(&self) -> Result<(), String> {
        check_positive_amount(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteOrganizationParams {
    pub organization_id: i32,
}

impl Validate for DeleteOrganizationParams {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerParams {
    pub ticker: String,
}

impl Validate for TickerParams {
    fn validate(&self) -> Result<(), String> {
        if self.ticker.trim().is_empty() {
            Err("Ticker must not be empty.".to_string())
        } else {
            Ok(())
        }
    }
}

/// Query of `GET /prices/history`; both bounds are inclusive and optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryParams {
    pub ticker: String,
    pub start_date: Option<DateTime<FixedOffset>>,
    pub end_date: Option<DateTime<FixedOffset>>,
}

impl Validate for PriceHistoryParams {
    fn validate(&self) -> Result<(), String> {
        if self.ticker.trim().is_empty() {
            return Err("Ticker must not be empty.".to_string());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err("start_date must not be after end_date.".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self { detail: detail.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationCreated {
    pub organization_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageCreated {
    pub storage_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCreated {
    pub price_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub distance: f64,
}

/// Storage that can take all of an organization's waste, with its distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableStorage {
    pub storage_id: i32,
    pub name: String,
    pub distance: f64,
    pub capacities: Vec<StorageCapacity>,
    pub current_levels: Vec<StorageCurrentLevel>,
}
