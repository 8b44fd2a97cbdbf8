//! Reservation ledger: append-only log of stock holds kept in a row store.
//!
//! Rows are never deleted. Lifecycle transitions rewrite the status cell with a
//! guarded write (expected current text), so repeated or concurrent sweeps,
//! confirmations and cancellations are no-ops the second time around.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use larder_core::{OrderId, Sku};
use larder_inventory::{Reservation, ReservationLine, ReservationStatus, expiry_for};
use larder_orders::ClientInfo;

use crate::error::{EngineError, EngineResult, StoreError};
use crate::row_store::{CellUpdate, RowStore};
use crate::sheets::orders::{self, OrderHeader};
use crate::sheets::{HeaderMap, Numbered, decode_rows, ensure_headers, reservations};

/// Everything needed to record a new holding order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub lines: Vec<ReservationLine>,
    pub client: ClientInfo,
    pub total: Option<f64>,
    pub created_at: DateTime<Utc>,
}

pub trait ReservationLedger: Send + Sync {
    /// Record one `HELD` row per line plus the order header; returns the expiry.
    ///
    /// Either every line is recorded as held or, after a failed write, every
    /// row already written for the order is cancelled and the error returned.
    fn add(&self, order: &NewOrder) -> EngineResult<DateTime<Utc>>;

    /// Reservations that count against stock at `now`, optionally for one SKU.
    fn list_active(&self, sku: Option<&Sku>, now: DateTime<Utc>) -> EngineResult<Vec<Reservation>>;

    /// Every row of one order, whatever its status.
    fn list_order(&self, order_id: &OrderId) -> EngineResult<Vec<Reservation>>;

    /// Mark lapsed holds `EXPIRED`; returns how many rows changed.
    fn sweep_expired(&self, now: DateTime<Utc>) -> EngineResult<usize>;

    /// Confirm the order's unexpired holds; returns how many rows changed.
    fn confirm(&self, order_id: &OrderId, now: DateTime<Utc>) -> EngineResult<usize>;

    /// Cancel the order's holds; returns how many rows changed.
    fn cancel(&self, order_id: &OrderId) -> EngineResult<usize>;
}

impl<L> ReservationLedger for Arc<L>
where
    L: ReservationLedger + ?Sized,
{
    fn add(&self, order: &NewOrder) -> EngineResult<DateTime<Utc>> {
        (**self).add(order)
    }

    fn list_active(&self, sku: Option<&Sku>, now: DateTime<Utc>) -> EngineResult<Vec<Reservation>> {
        (**self).list_active(sku, now)
    }

    fn list_order(&self, order_id: &OrderId) -> EngineResult<Vec<Reservation>> {
        (**self).list_order(order_id)
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> EngineResult<usize> {
        (**self).sweep_expired(now)
    }

    fn confirm(&self, order_id: &OrderId, now: DateTime<Utc>) -> EngineResult<usize> {
        (**self).confirm(order_id, now)
    }

    fn cancel(&self, order_id: &OrderId) -> EngineResult<usize> {
        (**self).cancel(order_id)
    }
}

/// A decoded ledger row plus the status text it was read with.
#[derive(Debug, Clone)]
struct LedgerRow {
    row: usize,
    raw_status: String,
    reservation: Reservation,
}

/// Ledger backed by a reservations sheet and an order header sheet.
#[derive(Debug)]
pub struct RowReservationLedger<S> {
    store: S,
    reservations_sheet: String,
    orders_sheet: String,
}

impl<S> RowReservationLedger<S> {
    pub fn new(store: S, reservations_sheet: impl Into<String>, orders_sheet: impl Into<String>) -> Self {
        Self {
            store,
            reservations_sheet: reservations_sheet.into(),
            orders_sheet: orders_sheet.into(),
        }
    }
}

impl<S: RowStore> RowReservationLedger<S> {
    /// Write missing header rows on both sheets.
    pub fn ensure_headers(&self) -> EngineResult<()> {
        ensure_headers(&self.store, &self.reservations_sheet, &reservations::LAYOUT)?;
        ensure_headers(&self.store, &self.orders_sheet, &orders::LAYOUT)?;
        Ok(())
    }

    fn load(&self) -> EngineResult<(HeaderMap, Vec<LedgerRow>)> {
        let rows = self.store.read_all(&self.reservations_sheet)?;
        let (map, decoded) = decode_rows(
            &self.reservations_sheet,
            &reservations::LAYOUT,
            &rows,
            reservations::decode,
        )?;
        let ledger_rows = decoded
            .into_iter()
            .map(|Numbered { row, value }| LedgerRow {
                raw_status: map.cell(&rows[row - 1], reservations::STATUS).to_string(),
                row,
                reservation: value,
            })
            .collect();
        Ok((map, ledger_rows))
    }

    fn transition(
        &self,
        map: &HeaderMap,
        targets: &[&LedgerRow],
        to: ReservationStatus,
    ) -> EngineResult<usize> {
        if targets.is_empty() {
            return Ok(0);
        }
        let column = map.position(reservations::STATUS);
        let updates: Vec<CellUpdate> = targets
            .iter()
            .map(|t| CellUpdate::guarded(t.row, column, t.raw_status.clone(), to.as_code()))
            .collect();
        Ok(self.store.batch_update(&self.reservations_sheet, &updates)?)
    }

    /// Move `HELD` order headers to `to`. Headers mirror the lines, so a
    /// failure here is logged rather than failing the transition.
    fn update_headers(&self, order_ids: &HashSet<&OrderId>, to: ReservationStatus) {
        if order_ids.is_empty() {
            return;
        }
        if let Err(error) = self.try_update_headers(order_ids, to) {
            tracing::warn!(
                sheet = %self.orders_sheet,
                status = %to,
                %error,
                "failed to update order headers"
            );
        }
    }

    fn try_update_headers(
        &self,
        order_ids: &HashSet<&OrderId>,
        to: ReservationStatus,
    ) -> Result<usize, StoreError> {
        let rows = self.store.read_all(&self.orders_sheet)?;
        let Some((header, data)) = rows.split_first() else {
            return Ok(0);
        };
        let map = HeaderMap::resolve(&self.orders_sheet, &orders::LAYOUT, header)?;
        let column = map.position(orders::STATUS);

        let updates: Vec<CellUpdate> = data
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let id = orders::order_id_of(&map, row)?;
                let raw = map.cell(row, orders::STATUS);
                let held = ReservationStatus::from_code(raw) == Some(ReservationStatus::Held);
                (held && order_ids.contains(&id))
                    .then(|| CellUpdate::guarded(i + 2, column, raw, to.as_code()))
            })
            .collect();
        self.store.batch_update(&self.orders_sheet, &updates)
    }

    fn roll_back(&self, map: &HeaderMap, order_id: &OrderId, written: &[usize]) {
        if written.is_empty() {
            return;
        }
        let column = map.position(reservations::STATUS);
        let updates: Vec<CellUpdate> = written
            .iter()
            .map(|row| {
                CellUpdate::guarded(
                    *row,
                    column,
                    ReservationStatus::Held.as_code(),
                    ReservationStatus::Cancelled.as_code(),
                )
            })
            .collect();

        match self.store.batch_update(&self.reservations_sheet, &updates) {
            Ok(cancelled) => {
                tracing::warn!(order_id = %order_id, cancelled, "rolled back partially written order")
            }
            Err(error) => tracing::error!(
                order_id = %order_id,
                rows = ?written,
                %error,
                "rollback of partially written order failed"
            ),
        }
    }
}

impl<S: RowStore> ReservationLedger for RowReservationLedger<S> {
    fn add(&self, order: &NewOrder) -> EngineResult<DateTime<Utc>> {
        let Some(first) = order.lines.first() else {
            return Err(EngineError::validation("order has no lines"));
        };
        if let Some(bad) = order.lines.iter().find(|l| l.quantity <= 0) {
            return Err(EngineError::validation(format!(
                "quantity for {} must be positive",
                bad.sku
            )));
        }

        let res_map = ensure_headers(&self.store, &self.reservations_sheet, &reservations::LAYOUT)?;
        let ord_map = ensure_headers(&self.store, &self.orders_sheet, &orders::LAYOUT)?;

        let mut written = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let reservation = Reservation::hold(
                order.order_id.clone(),
                line.clone(),
                order.client.name.clone(),
                order.created_at,
            );
            let row = reservations::encode(&res_map, &reservation);
            match self.store.append(&self.reservations_sheet, row) {
                Ok(number) => written.push(number),
                Err(error) => {
                    self.roll_back(&res_map, &order.order_id, &written);
                    return Err(error.into());
                }
            }
        }

        let header = OrderHeader {
            order_id: order.order_id.clone(),
            created_at: order.created_at,
            delivery_date: first.delivery_date,
            status: ReservationStatus::Held,
            client: order.client.clone(),
            total: order.total,
        };
        if let Err(error) = self
            .store
            .append(&self.orders_sheet, orders::encode(&ord_map, &header))
        {
            self.roll_back(&res_map, &order.order_id, &written);
            return Err(error.into());
        }

        Ok(expiry_for(order.created_at))
    }

    fn list_active(&self, sku: Option<&Sku>, now: DateTime<Utc>) -> EngineResult<Vec<Reservation>> {
        let (_, rows) = self.load()?;
        Ok(rows
            .into_iter()
            .map(|r| r.reservation)
            .filter(|r| r.counts_against_stock(now) && sku.is_none_or(|s| &r.sku == s))
            .collect())
    }

    fn list_order(&self, order_id: &OrderId) -> EngineResult<Vec<Reservation>> {
        let (_, rows) = self.load()?;
        Ok(rows
            .into_iter()
            .map(|r| r.reservation)
            .filter(|r| &r.order_id == order_id)
            .collect())
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> EngineResult<usize> {
        let (map, rows) = self.load()?;
        let lapsed: Vec<&LedgerRow> = rows
            .iter()
            .filter(|r| r.reservation.is_lapsed_hold(now))
            .collect();

        let expired = self.transition(&map, &lapsed, ReservationStatus::Expired)?;
        if expired > 0 {
            let orders: HashSet<&OrderId> = lapsed.iter().map(|r| &r.reservation.order_id).collect();
            self.update_headers(&orders, ReservationStatus::Expired);
            tracing::info!(expired, orders = orders.len(), "expired lapsed reservations");
        }
        Ok(expired)
    }

    fn confirm(&self, order_id: &OrderId, now: DateTime<Utc>) -> EngineResult<usize> {
        let (map, rows) = self.load()?;
        let holds: Vec<&LedgerRow> = rows
            .iter()
            .filter(|r| {
                &r.reservation.order_id == order_id
                    && r.reservation.status == ReservationStatus::Held
                    && r.reservation.expires_at > now
            })
            .collect();

        let confirmed = self.transition(&map, &holds, ReservationStatus::Confirmed)?;
        if confirmed > 0 {
            self.update_headers(&HashSet::from([order_id]), ReservationStatus::Confirmed);
        }
        Ok(confirmed)
    }

    fn cancel(&self, order_id: &OrderId) -> EngineResult<usize> {
        let (map, rows) = self.load()?;
        let holds: Vec<&LedgerRow> = rows
            .iter()
            .filter(|r| {
                &r.reservation.order_id == order_id
                    && r.reservation.status == ReservationStatus::Held
            })
            .collect();

        let cancelled = self.transition(&map, &holds, ReservationStatus::Cancelled)?;
        if cancelled > 0 {
            self.update_headers(&HashSet::from([order_id]), ReservationStatus::Cancelled);
        }
        Ok(cancelled)
    }
}
