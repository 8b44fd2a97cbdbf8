//! Order lifecycle domain module.
//!
//! An order is the set of reservation lines sharing one order id. This crate
//! holds the lifecycle rules as a deterministic aggregate (no IO, no HTTP, no
//! storage); the infrastructure layer rehydrates it from ledger rows.

pub mod cart;
pub mod order;

pub use cart::{CartLine, ClientInfo, consolidate};
pub use order::{
    CancelOrder, ConfirmOrder, OrderCancelled, OrderCommand, OrderConfirmed,
    OrderEvent, OrderExpired, OrderStatus, OrderSubmitted, OrderSummary, ReservationOrder,
    SubmitOrder,
};
