use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of waste an organization generates and a storage accepts.
///
/// Serialized as uppercase tokens (`BIO_WASTE`, `GLASS`, `PLASTIC`) both on the
/// wire and in the `waste_type` PostgreSQL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "waste_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WasteType {
    BioWaste,
    Glass,
    Plastic,
}

impl WasteType {
    pub const ALL: [WasteType; 3] = [WasteType::BioWaste, WasteType::Glass, WasteType::Plastic];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteType::BioWaste => "BIO_WASTE",
            WasteType::Glass => "GLASS",
            WasteType::Plastic => "PLASTIC",
        }
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown waste type: {0}")]
pub struct UnknownWasteType(pub String);

impl FromStr for WasteType {
    type Err = UnknownWasteType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WasteType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownWasteType(s.to_string()))
    }
}

/// Requested quantity of one waste type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WasteAmount {
    pub waste_type: WasteType,
    pub amount: i32,
}

impl WasteAmount {
    pub fn new(waste_type: WasteType, amount: i32) -> Self {
        Self { waste_type, amount }
    }
}
