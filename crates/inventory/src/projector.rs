//! Per-date stock projection.
//!
//! `available(sku, date) = max(0, round(base) - held_through(date) + incoming_through(date))`
//! where both sums are cumulative up to and including `date`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use larder_core::Sku;

use crate::reservation::Reservation;
use crate::shipment::IncomingShipment;

/// At or below this many units a SKU is reported as `low`.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Ok,
    Low,
    Out,
}

impl StockStatus {
    pub fn classify(available: i64) -> Self {
        if available <= 0 {
            StockStatus::Out
        } else if available <= LOW_STOCK_THRESHOLD {
            StockStatus::Low
        } else {
            StockStatus::Ok
        }
    }
}

/// Availability of one SKU on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    pub sku: Sku,
    pub date: NaiveDate,
    pub projected_available: i64,
    pub status: StockStatus,
    pub has_incoming_on_date: bool,
}

/// Round half-up (`2.5 -> 3`, `-2.5 -> -2`). Non-finite input counts as zero.
pub fn round_stock(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    // `value + 0.5` would round 0.49999999999999994 up. `as` saturates.
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

/// Projection over a fixed view of the ledger and the shipment schedule.
#[derive(Debug, Clone, Copy)]
pub struct StockProjector<'a> {
    reservations: &'a [Reservation],
    shipments: &'a [IncomingShipment],
    now: DateTime<Utc>,
}

impl<'a> StockProjector<'a> {
    pub fn new(
        reservations: &'a [Reservation],
        shipments: &'a [IncomingShipment],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            reservations,
            shipments,
            now,
        }
    }

    fn held_through(&self, sku: &Sku, date: NaiveDate) -> i64 {
        self.reservations
            .iter()
            .filter(|r| &r.sku == sku && r.delivery_date <= date && r.counts_against_stock(self.now))
            .fold(0i64, |acc, r| acc.saturating_add(r.quantity))
    }

    fn incoming_through(&self, sku: &Sku, date: NaiveDate) -> i64 {
        self.shipments
            .iter()
            .filter(|s| &s.sku == sku && s.arrival_date <= date)
            .fold(0i64, |acc, s| acc.saturating_add(s.quantity))
    }

    /// Unclamped balance; may be negative when the SKU is oversold.
    pub fn net_position(&self, sku: &Sku, base_stock: f64, date: NaiveDate) -> i64 {
        round_stock(base_stock)
            .saturating_sub(self.held_through(sku, date))
            .saturating_add(self.incoming_through(sku, date))
    }

    pub fn projected_available(&self, sku: &Sku, base_stock: f64, date: NaiveDate) -> i64 {
        self.net_position(sku, base_stock, date).max(0)
    }

    pub fn has_incoming_on(&self, sku: &Sku, date: NaiveDate) -> bool {
        self.shipments
            .iter()
            .any(|s| &s.sku == sku && s.arrival_date == date)
    }

    pub fn snapshot(&self, sku: &Sku, base_stock: f64, date: NaiveDate) -> AvailabilitySnapshot {
        let projected_available = self.projected_available(sku, base_stock, date);
        AvailabilitySnapshot {
            sku: sku.clone(),
            date,
            projected_available,
            status: StockStatus::classify(projected_available),
            has_incoming_on_date: self.has_incoming_on(sku, date),
        }
    }

    /// One snapshot per requested date, in request order.
    pub fn snapshots(
        &self,
        sku: &Sku,
        base_stock: f64,
        dates: &[NaiveDate],
    ) -> Vec<AvailabilitySnapshot> {
        dates
            .iter()
            .map(|d| self.snapshot(sku, base_stock, *d))
            .collect()
    }
}
