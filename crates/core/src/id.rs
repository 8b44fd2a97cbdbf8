//! Strongly-typed identifiers used across the engine.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Numeric SKU codes at or above this value are sold by the box.
pub const BOX_SKU_THRESHOLD: u64 = 410_000;

/// Identifier shared by every ledger line of one order.
///
/// Ids read back from the store are kept verbatim, so this is a string
/// newtype rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a fresh, time-ordered order id.
    pub fn generate() -> Self {
        Self(format!("ORD-{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("OrderId: empty"));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Stock-keeping unit code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the code, if it is purely numeric.
    pub fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// Selling unit derived from the numeric code range.
    pub fn unit_kind(&self) -> UnitKind {
        match self.numeric() {
            Some(code) if code >= BOX_SKU_THRESHOLD => UnitKind::Box,
            _ => UnitKind::Unit,
        }
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Sku {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("Sku: empty"));
        }
        // Spreadsheet feeds sometimes render numeric codes as floats ("410010.0").
        let code = match trimmed.strip_suffix(".0") {
            Some(head) if !head.is_empty() && head.bytes().all(|b| b.is_ascii_digit()) => head,
            _ => trimmed,
        };
        Ok(Self(code.to_string()))
    }
}

/// How a SKU is counted on a reservation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Individually weighed unit (`UND`).
    Unit,
    /// Fixed-size box (`CX`).
    Box,
}

impl UnitKind {
    /// Code written to the unit column of a reservation row.
    pub fn as_code(&self) -> &'static str {
        match self {
            UnitKind::Unit => "UND",
            UnitKind::Box => "CX",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "UND" | "UN" => Some(UnitKind::Unit),
            "CX" => Some(UnitKind::Box),
            _ => None,
        }
    }
}
