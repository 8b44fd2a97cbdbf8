//! Infrastructure layer: row store port, sheet codecs, reservation ledger,
//! feeds, caching, availability planning and the order controller.

pub mod cache;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod feeds;
pub mod ledger;
pub mod planner;
pub mod row_store;
pub mod sheets;


pub use config::{ConfigError, EngineConfig, SheetNames};
pub use controller::{OrderController, OrderReceipt, SubmitRequest};
pub use engine::Engine;
pub use error::{EngineError, EngineResult, FeedError, StoreError};
pub use planner::{AvailabilityPlanner, DateCandidate, LimitingLine};
