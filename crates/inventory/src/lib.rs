//! Inventory domain module: reservations, incoming shipments and the stock
//! projection that combines them.
//!
//! This crate contains business rules only, implemented as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod projector;
pub mod reservation;
pub mod shipment;

pub use projector::{
    AvailabilitySnapshot, LOW_STOCK_THRESHOLD, StockProjector, StockStatus, round_stock,
};
pub use reservation::{
    RESERVATION_TTL_MINUTES, Reservation, ReservationLine, ReservationStatus, expiry_for,
    reservation_ttl,
};
pub use shipment::IncomingShipment;
