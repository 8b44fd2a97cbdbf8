use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use larder_core::{Aggregate, AggregateRoot, DomainError, OrderId};
use larder_inventory::{Reservation, ReservationLine, ReservationStatus, expiry_for};

use crate::cart::ClientInfo;

/// Order status lifecycle.
///
/// `PendingSubmit -> Reserved -> {Confirmed | Expired | Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingSubmit,
    Reserved,
    Confirmed,
    Expired,
    Cancelled,
}

/// Aggregate root: ReservationOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationOrder {
    id: OrderId,
    status: OrderStatus,
    lines: Vec<ReservationLine>,
    client: ClientInfo,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    version: u64,
}

/// Read view of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub delivery_date: Option<NaiveDate>,
    pub client_name: String,
    pub lines: Vec<ReservationLine>,
}

impl ReservationOrder {
    /// Create an empty, not-yet-submitted aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            status: OrderStatus::PendingSubmit,
            lines: Vec::new(),
            client: ClientInfo::default(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
            version: 0,
        }
    }

    /// Rebuild an order from its ledger rows as observed at `as_of`.
    ///
    /// The ledger does not record transition times, so derived transitions
    /// are stamped with `as_of` (expiry uses the stored expiry instant).
    /// Returns `None` when there are no rows.
    pub fn rehydrate(id: OrderId, rows: &[Reservation], as_of: DateTime<Utc>) -> Option<Self> {
        let mut order = Self::empty(id);
        let history = Self::ledger_history(&order.id, rows, as_of)?;
        for event in &history {
            order.apply(event);
        }
        Some(order)
    }

    fn ledger_history(
        id: &OrderId,
        rows: &[Reservation],
        as_of: DateTime<Utc>,
    ) -> Option<Vec<OrderEvent>> {
        let first = rows.iter().min_by_key(|r| r.created_at)?;

        let mut history = vec![OrderEvent::OrderSubmitted(OrderSubmitted {
            order_id: id.clone(),
            lines: rows
                .iter()
                .map(|r| ReservationLine {
                    sku: r.sku.clone(),
                    description: r.description.clone(),
                    quantity: r.quantity,
                    unit: r.unit,
                    delivery_date: r.delivery_date,
                })
                .collect(),
            client: ClientInfo {
                name: first.client_name.clone(),
                ..ClientInfo::default()
            },
            created_at: first.created_at,
            expires_at: first.expires_at,
        })];

        let has = |status: ReservationStatus| rows.iter().any(|r| r.effective_status(as_of) == status);
        if has(ReservationStatus::Confirmed) {
            history.push(OrderEvent::OrderConfirmed(OrderConfirmed {
                order_id: id.clone(),
                occurred_at: as_of,
            }));
        } else if has(ReservationStatus::Held) {
            // Still reserved.
        } else if has(ReservationStatus::Expired) {
            history.push(OrderEvent::OrderExpired(OrderExpired {
                order_id: id.clone(),
                occurred_at: first.expires_at,
            }));
        } else {
            history.push(OrderEvent::OrderCancelled(OrderCancelled {
                order_id: id.clone(),
                occurred_at: as_of,
            }));
        }
        Some(history)
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[ReservationLine] {
        &self.lines
    }

    pub fn client(&self) -> &ClientInfo {
        &self.client
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn delivery_date(&self) -> Option<NaiveDate> {
        self.lines.first().map(|l| l.delivery_date)
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            order_id: self.id.clone(),
            status: self.status,
            created_at: self.created_at,
            expires_at: self.expires_at,
            delivery_date: self.delivery_date(),
            client_name: self.client.name.clone(),
            lines: self.lines.clone(),
        }
    }

    fn is_submitted(&self) -> bool {
        self.status != OrderStatus::PendingSubmit
    }
}

impl AggregateRoot for ReservationOrder {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: SubmitOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOrder {
    pub order_id: OrderId,
    pub lines: Vec<ReservationLine>,
    pub client: ClientInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    SubmitOrder(SubmitOrder),
    ConfirmOrder(ConfirmOrder),
    CancelOrder(CancelOrder),
}

/// Event: OrderSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmitted {
    pub order_id: OrderId,
    pub lines: Vec<ReservationLine>,
    pub client: ClientInfo,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Event: OrderConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmed {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderExpired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExpired {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderSubmitted(OrderSubmitted),
    OrderConfirmed(OrderConfirmed),
    OrderCancelled(OrderCancelled),
    OrderExpired(OrderExpired),
}

impl Aggregate for ReservationOrder {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderSubmitted(e) => {
                self.id = e.order_id.clone();
                self.lines = e.lines.clone();
                self.client = e.client.clone();
                self.created_at = e.created_at;
                self.expires_at = e.expires_at;
                self.status = OrderStatus::Reserved;
            }
            OrderEvent::OrderConfirmed(_) => {
                self.status = OrderStatus::Confirmed;
            }
            OrderEvent::OrderCancelled(_) => {
                self.status = OrderStatus::Cancelled;
            }
            OrderEvent::OrderExpired(_) => {
                self.status = OrderStatus::Expired;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::SubmitOrder(cmd) => self.handle_submit(cmd),
            OrderCommand::ConfirmOrder(cmd) => self.handle_confirm(cmd),
            OrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl ReservationOrder {
    fn ensure_order_id(&self, order_id: &OrderId) -> Result<(), DomainError> {
        if &self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_submitted(&self, order_id: &OrderId) -> Result<(), DomainError> {
        if !self.is_submitted() {
            return Err(DomainError::not_found());
        }
        self.ensure_order_id(order_id)
    }

    fn handle_submit(&self, cmd: &SubmitOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.is_submitted() {
            return Err(DomainError::conflict("order already submitted"));
        }
        self.ensure_order_id(&cmd.order_id)?;

        let Some(first) = cmd.lines.first() else {
            return Err(DomainError::validation("order has no lines"));
        };
        for (i, line) in cmd.lines.iter().enumerate() {
            if line.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "quantity for {} must be positive",
                    line.sku
                )));
            }
            if line.delivery_date != first.delivery_date {
                return Err(DomainError::validation(
                    "all lines of an order must share one delivery date",
                ));
            }
            if cmd.lines[..i].iter().any(|prev| prev.sku == line.sku) {
                return Err(DomainError::validation(format!(
                    "sku {} appears on more than one line",
                    line.sku
                )));
            }
        }

        Ok(vec![OrderEvent::OrderSubmitted(OrderSubmitted {
            order_id: cmd.order_id.clone(),
            lines: cmd.lines.clone(),
            client: cmd.client.clone(),
            created_at: cmd.occurred_at,
            expires_at: expiry_for(cmd.occurred_at),
        })])
    }

    fn handle_confirm(&self, cmd: &ConfirmOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_submitted(&cmd.order_id)?;

        match self.status {
            OrderStatus::Confirmed => Ok(Vec::new()),
            OrderStatus::Reserved if cmd.occurred_at < self.expires_at => {
                Ok(vec![OrderEvent::OrderConfirmed(OrderConfirmed {
                    order_id: cmd.order_id.clone(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            _ => Err(DomainError::conflict("order lapsed: hold expired or cancelled")),
        }
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_submitted(&cmd.order_id)?;

        if self.status != OrderStatus::Reserved {
            return Err(DomainError::conflict(
                "order lapsed: only reserved orders can be cancelled",
            ));
        }

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelled {
            order_id: cmd.order_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use larder_core::Sku;
    use proptest::prelude::*;

    fn test_order_id() -> OrderId {
        OrderId::generate()
    }

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap()
    }

    fn delivery() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn test_line(code: &str, qty: i64) -> ReservationLine {
        let sku: Sku = code.parse().unwrap();
        ReservationLine::new(sku, "Salame", qty, delivery()).unwrap()
    }

    fn submitted(order_id: &OrderId) -> ReservationOrder {
        let mut order = ReservationOrder::empty(order_id.clone());
        let cmd = SubmitOrder {
            order_id: order_id.clone(),
            lines: vec![test_line("100", 2), test_line("410001", 1)],
            client: ClientInfo {
                name: "Mercado Central".into(),
                ..ClientInfo::default()
            },
            occurred_at: test_time(),
        };
        let events = order.handle(&OrderCommand::SubmitOrder(cmd)).unwrap();
        order.apply(&events[0]);
        order
    }

    #[test]
    fn submit_emits_order_submitted_with_two_hour_expiry() {
        let order_id = test_order_id();
        let order = ReservationOrder::empty(order_id.clone());
        let cmd = SubmitOrder {
            order_id: order_id.clone(),
            lines: vec![test_line("100", 3)],
            client: ClientInfo::default(),
            occurred_at: test_time(),
        };

        let events = order.handle(&OrderCommand::SubmitOrder(cmd)).unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            OrderEvent::OrderSubmitted(e) => {
                assert_eq!(e.order_id, order_id);
                assert_eq!(e.lines.len(), 1);
                assert_eq!(e.expires_at, test_time() + Duration::hours(2));
            }
            _ => panic!("Expected OrderSubmitted event"),
        }
    }

    #[test]
    fn submit_rejects_empty_duplicate_and_mixed_dates() {
        let order_id = test_order_id();
        let order = ReservationOrder::empty(order_id.clone());
        let submit = |lines: Vec<ReservationLine>| {
            order.handle(&OrderCommand::SubmitOrder(SubmitOrder {
                order_id: order_id.clone(),
                lines,
                client: ClientInfo::default(),
                occurred_at: test_time(),
            }))
        };

        assert!(matches!(submit(vec![]), Err(DomainError::Validation(_))));
        assert!(matches!(
            submit(vec![test_line("100", 1), test_line("100", 2)]),
            Err(DomainError::Validation(msg)) if msg.contains("more than one line")
        ));

        let mut other_day = test_line("200", 1);
        other_day.delivery_date = delivery() + Duration::days(1);
        assert!(matches!(
            submit(vec![test_line("100", 1), other_day]),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn cannot_submit_twice() {
        let order_id = test_order_id();
        let order = submitted(&order_id);
        let err = order
            .handle(&OrderCommand::SubmitOrder(SubmitOrder {
                order_id: order_id.clone(),
                lines: vec![test_line("100", 1)],
                client: ClientInfo::default(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn confirm_before_expiry_then_idempotent() {
        let order_id = test_order_id();
        let mut order = submitted(&order_id);
        let confirm = ConfirmOrder {
            order_id: order_id.clone(),
            occurred_at: test_time() + Duration::minutes(90),
        };

        let events = order
            .handle(&OrderCommand::ConfirmOrder(confirm.clone()))
            .unwrap();
        assert_eq!(events.len(), 1);
        order.apply(&events[0]);
        assert_eq!(order.status(), OrderStatus::Confirmed);

        let again = order.handle(&OrderCommand::ConfirmOrder(confirm)).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn confirm_after_expiry_is_lapsed() {
        let order_id = test_order_id();
        let order = submitted(&order_id);
        let err = order
            .handle(&OrderCommand::ConfirmOrder(ConfirmOrder {
                order_id: order_id.clone(),
                occurred_at: test_time() + Duration::minutes(121),
            }))
            .unwrap_err();
        match err {
            DomainError::Conflict(msg) if msg.contains("order lapsed") => {}
            _ => panic!("Expected Conflict for lapsed order"),
        }
    }

    #[test]
    fn unsubmitted_order_is_not_found() {
        let order_id = test_order_id();
        let order = ReservationOrder::empty(order_id.clone());
        let err = order
            .handle(&OrderCommand::CancelOrder(CancelOrder {
                order_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn cancel_only_from_reserved() {
        let order_id = test_order_id();
        let mut order = submitted(&order_id);
        let cancel = CancelOrder {
            order_id: order_id.clone(),
            occurred_at: test_time(),
        };

        let events = order
            .handle(&OrderCommand::CancelOrder(cancel.clone()))
            .unwrap();
        order.apply(&events[0]);
        assert_eq!(order.status(), OrderStatus::Cancelled);

        let err = order
            .handle(&OrderCommand::CancelOrder(cancel))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    fn rows(order_id: &OrderId, statuses: &[ReservationStatus]) -> Vec<Reservation> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut r = Reservation::hold(
                    order_id.clone(),
                    test_line(&format!("{}", 100 + i), 1),
                    "Mercado Central",
                    test_time(),
                );
                r.status = *status;
                r
            })
            .collect()
    }

    #[test]
    fn rehydrate_derives_status_from_ledger_rows() {
        let order_id = test_order_id();
        let at = test_time() + Duration::minutes(10);
        use ReservationStatus::*;

        let cases = [
            (vec![Held, Held], OrderStatus::Reserved),
            (vec![Confirmed, Expired], OrderStatus::Confirmed),
            (vec![Expired, Cancelled], OrderStatus::Expired),
            (vec![Cancelled, Cancelled], OrderStatus::Cancelled),
        ];
        for (statuses, expected) in cases {
            let order = ReservationOrder::rehydrate(order_id.clone(), &rows(&order_id, &statuses), at)
                .unwrap();
            assert_eq!(order.status(), expected, "{statuses:?}");
            assert_eq!(order.lines().len(), statuses.len());
            assert_eq!(order.client().name, "Mercado Central");
        }

        assert!(ReservationOrder::rehydrate(order_id, &[], at).is_none());
    }

    #[test]
    fn rehydrate_treats_lapsed_holds_as_expired() {
        let order_id = test_order_id();
        let order = ReservationOrder::rehydrate(
            order_id.clone(),
            &rows(&order_id, &[ReservationStatus::Held]),
            test_time() + Duration::minutes(121),
        )
        .unwrap();
        assert_eq!(order.status(), OrderStatus::Expired);
        assert_eq!(order.summary().delivery_date, Some(delivery()));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: handle never mutates state and is deterministic.
        #[test]
        fn handle_is_pure(
            quantities in prop::collection::vec(1i64..1000, 1..8),
            minutes in 0i64..240,
        ) {
            let order_id = test_order_id();
            let mut order = ReservationOrder::empty(order_id.clone());
            let lines: Vec<ReservationLine> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| test_line(&format!("{}", 1000 + i), *q))
                .collect();
            let events = order
                .handle(&OrderCommand::SubmitOrder(SubmitOrder {
                    order_id: order_id.clone(),
                    lines,
                    client: ClientInfo::default(),
                    occurred_at: test_time(),
                }))
                .unwrap();
            order.apply(&events[0]);

            let before = order.clone();
            let confirm = OrderCommand::ConfirmOrder(ConfirmOrder {
                order_id,
                occurred_at: test_time() + Duration::minutes(minutes),
            });
            let first = order.handle(&confirm);
            let second = order.handle(&confirm);

            prop_assert_eq!(&before, &order);
            prop_assert_eq!(first.clone(), second);
            prop_assert_eq!(first.is_ok(), minutes < 120);
        }
    }
}
