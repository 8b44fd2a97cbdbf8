use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, OrderId, Sku, UnitKind};

/// Lifetime of a hold before it lapses.
pub const RESERVATION_TTL_MINUTES: i64 = 120;

pub fn reservation_ttl() -> Duration {
    Duration::minutes(RESERVATION_TTL_MINUTES)
}

/// Expiry instant for a hold created at `created_at`.
pub fn expiry_for(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + reservation_ttl()
}

/// Reservation status lifecycle.
///
/// `Held` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Held,
    Confirmed,
    Expired,
    Cancelled,
}

impl ReservationStatus {
    /// Text stored in the status column.
    pub fn as_code(&self) -> &'static str {
        match self {
            ReservationStatus::Held => "HELD",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Expired => "EXPIRED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parse a status cell. Rows written by the legacy storefront use
    /// Portuguese status names.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "HELD" | "RESERVADO" => Some(ReservationStatus::Held),
            "CONFIRMED" | "CONFIRMADO" => Some(ReservationStatus::Confirmed),
            "EXPIRED" | "EXPIRADO" => Some(ReservationStatus::Expired),
            "CANCELLED" | "CANCELED" | "CANCELADO" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }
}

impl core::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// One cart line to be held under an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationLine {
    pub sku: Sku,
    pub description: String,
    pub quantity: i64,
    pub unit: UnitKind,
    pub delivery_date: NaiveDate,
}

impl ReservationLine {
    /// Build a line, deriving the unit from the SKU code.
    pub fn new(
        sku: Sku,
        description: impl Into<String>,
        quantity: i64,
        delivery_date: NaiveDate,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity for {sku} must be positive, got {quantity}"
            )));
        }
        Ok(Self {
            unit: sku.unit_kind(),
            sku,
            description: description.into(),
            quantity,
            delivery_date,
        })
    }
}

/// A ledger entry: one held cart line of one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub order_id: OrderId,
    pub sku: Sku,
    pub description: String,
    pub quantity: i64,
    pub unit: UnitKind,
    pub client_name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub delivery_date: NaiveDate,
    pub status: ReservationStatus,
}

impl Reservation {
    /// A fresh `Held` reservation for `line`.
    pub fn hold(
        order_id: OrderId,
        line: ReservationLine,
        client_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            sku: line.sku,
            description: line.description,
            quantity: line.quantity,
            unit: line.unit,
            client_name: client_name.into(),
            created_at,
            expires_at: expiry_for(created_at),
            delivery_date: line.delivery_date,
            status: ReservationStatus::Held,
        }
    }

    /// Still `Held` but past its expiry: due for the sweep.
    pub fn is_lapsed_hold(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Held && self.expires_at <= now
    }

    /// Whether this entry reduces projected stock at `now`.
    pub fn counts_against_stock(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            ReservationStatus::Held => self.expires_at > now,
            ReservationStatus::Confirmed => true,
            ReservationStatus::Expired | ReservationStatus::Cancelled => false,
        }
    }

    /// Status as observed at `now`, treating lapsed holds as expired even
    /// before the sweep has written it.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ReservationStatus {
        if self.is_lapsed_hold(now) {
            ReservationStatus::Expired
        } else {
            self.status
        }
    }
}
