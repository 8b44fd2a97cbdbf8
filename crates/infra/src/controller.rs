//! Order lifecycle orchestration.
//!
//! Each operation follows the same pipeline:
//!
//! ```text
//! Request
//!   ↓
//! 1. Opportunistic sweep (lapsed holds become EXPIRED)
//!   ↓
//! 2. Load the order's ledger rows and rehydrate `ReservationOrder`
//!   ↓
//! 3. Handle the command (pure decision, produces events)
//!   ↓
//! 4. Write the matching status transitions to the ledger
//! ```
//!
//! The aggregate decides; the ledger is the only persisted state.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use larder_core::{Aggregate, OrderId, Sku};
use larder_inventory::Reservation;
use larder_orders::{
    CancelOrder, CartLine, ClientInfo, ConfirmOrder, OrderCommand, OrderEvent, OrderStatus,
    OrderSummary, ReservationOrder, SubmitOrder, consolidate,
};
use larder_routes::RouteQuery;

use crate::error::{EngineError, EngineResult};
use crate::ledger::{NewOrder, ReservationLedger};
use crate::planner::AvailabilityPlanner;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub query: RouteQuery,
    pub delivery_date: Option<NaiveDate>,
    pub cart: Vec<CartLine>,
    pub client: ClientInfo,
    pub total: Option<f64>,
}

/// What the caller gets back for a newly reserved order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub delivery_date: NaiveDate,
    pub status: OrderStatus,
}

pub struct OrderController {
    planner: Arc<AvailabilityPlanner>,
    ledger: Arc<dyn ReservationLedger>,
}

impl OrderController {
    pub fn new(planner: Arc<AvailabilityPlanner>, ledger: Arc<dyn ReservationLedger>) -> Self {
        Self { planner, ledger }
    }

    /// Reserve stock for a cart on one delivery date.
    ///
    /// Nothing is written unless every line fits; a shortage is reported as
    /// `StockConflict` for the first short line.
    pub fn submit(&self, request: &SubmitRequest, now: DateTime<Utc>) -> EngineResult<OrderReceipt> {
        let delivery_date = request
            .delivery_date
            .ok_or_else(|| EngineError::validation("deliveryDate is required"))?;
        let cart = consolidate(&request.cart)?;
        self.planner.check_date(&request.query, delivery_date, now)?;

        self.planner.opportunistic_sweep(now);
        let lines = self.planner.prepare_lines(&cart, delivery_date, now)?;

        let order_id = OrderId::generate();
        let mut order = ReservationOrder::empty(order_id.clone());
        let events = order.handle(&OrderCommand::SubmitOrder(SubmitOrder {
            order_id: order_id.clone(),
            lines: lines.clone(),
            client: request.client.clone(),
            occurred_at: now,
        }))?;

        let expires_at = self.ledger.add(&NewOrder {
            order_id: order_id.clone(),
            lines,
            client: request.client.clone(),
            total: request.total,
            created_at: now,
        })?;
        apply_all(&mut order, &events);

        tracing::info!(
            order_id = %order_id,
            lines = order.lines().len(),
            delivery_date = %delivery_date,
            expires_at = %expires_at,
            "order reserved"
        );

        Ok(OrderReceipt {
            order_id,
            created_at: now,
            expires_at,
            delivery_date,
            status: order.status(),
        })
    }

    /// Confirm a reserved order. Confirming twice is a no-op.
    pub fn confirm(&self, order_id: &OrderId, now: DateTime<Utc>) -> EngineResult<OrderSummary> {
        self.planner.opportunistic_sweep(now);
        let mut order = self.load(order_id, now)?;

        let events = order.handle(&OrderCommand::ConfirmOrder(ConfirmOrder {
            order_id: order_id.clone(),
            occurred_at: now,
        }))?;
        if events.is_empty() {
            return Ok(order.summary());
        }

        let confirmed = self.ledger.confirm(order_id, now)?;
        if confirmed == 0 {
            return Err(EngineError::OrderLapsed(format!(
                "order {order_id} has no held line left to confirm"
            )));
        }
        apply_all(&mut order, &events);

        tracing::info!(order_id = %order_id, lines = confirmed, "order confirmed");
        Ok(order.summary())
    }

    /// Release the stock held by a reserved order.
    pub fn cancel(&self, order_id: &OrderId, now: DateTime<Utc>) -> EngineResult<OrderSummary> {
        self.planner.opportunistic_sweep(now);
        let mut order = self.load(order_id, now)?;

        let events = order.handle(&OrderCommand::CancelOrder(CancelOrder {
            order_id: order_id.clone(),
            occurred_at: now,
        }))?;

        let cancelled = self.ledger.cancel(order_id)?;
        if cancelled == 0 {
            return Err(EngineError::OrderLapsed(format!(
                "order {order_id} has no held line left to cancel"
            )));
        }
        apply_all(&mut order, &events);

        tracing::info!(order_id = %order_id, lines = cancelled, "order cancelled");
        Ok(order.summary())
    }

    pub fn get(&self, order_id: &OrderId, now: DateTime<Utc>) -> EngineResult<OrderSummary> {
        self.planner.opportunistic_sweep(now);
        Ok(self.load(order_id, now)?.summary())
    }

    pub fn list_active(&self, sku: Option<&Sku>, now: DateTime<Utc>) -> EngineResult<Vec<Reservation>> {
        self.planner.opportunistic_sweep(now);
        self.ledger.list_active(sku, now)
    }

    /// Explicit sweep; unlike the opportunistic one, failures are returned.
    pub fn sweep(&self, now: DateTime<Utc>) -> EngineResult<usize> {
        self.ledger.sweep_expired(now)
    }

    fn load(&self, order_id: &OrderId, now: DateTime<Utc>) -> EngineResult<ReservationOrder> {
        let rows = self.ledger.list_order(order_id)?;
        ReservationOrder::rehydrate(order_id.clone(), &rows, now).ok_or(EngineError::NotFound)
    }
}

fn apply_all(order: &mut ReservationOrder, events: &[OrderEvent]) {
    for event in events {
        order.apply(event);
    }
}
