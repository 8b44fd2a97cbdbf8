//! `larder-core` — foundation building blocks shared by the engine crates.
//!
//! This crate contains **pure** primitives (no IO, no storage, no logging setup).

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{OrderId, Sku, UnitKind};
