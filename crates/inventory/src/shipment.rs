use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, Sku};

/// Scheduled inbound stock for a SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingShipment {
    pub sku: Sku,
    pub quantity: i64,
    pub arrival_date: NaiveDate,
}

impl IncomingShipment {
    pub fn new(sku: Sku, quantity: i64, arrival_date: NaiveDate) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("shipment quantity must be positive"));
        }
        Ok(Self {
            sku,
            quantity,
            arrival_date,
        })
    }
}
