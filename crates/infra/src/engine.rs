//! Wiring of the engine over one row store.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use larder_core::Clock;

use crate::cache::PlannerCaches;
use crate::config::EngineConfig;
use crate::controller::OrderController;
use crate::error::EngineResult;
use crate::feeds::{SheetCatalogFeed, SheetRouteFeed};
use crate::ledger::{ReservationLedger, RowReservationLedger};
use crate::planner::{AvailabilityPlanner, PlannerSettings};
use crate::row_store::RowStore;

/// Planner and controller sharing one ledger, plus the clock they run on.
#[derive(Clone)]
pub struct Engine {
    pub planner: Arc<AvailabilityPlanner>,
    pub controller: Arc<OrderController>,
    pub clock: Arc<dyn Clock>,
}

impl Engine {
    /// Build every component over `store`, writing missing ledger headers.
    pub fn new<S>(store: Arc<S>, config: &EngineConfig, clock: Arc<dyn Clock>) -> EngineResult<Self>
    where
        S: RowStore + 'static,
    {
        let sheets = &config.sheets;
        let ledger = Arc::new(RowReservationLedger::new(
            store.clone(),
            sheets.reservations.clone(),
            sheets.orders.clone(),
        ));
        ledger.ensure_headers()?;
        let ledger: Arc<dyn ReservationLedger> = ledger;

        let catalog = Arc::new(SheetCatalogFeed::new(
            store.clone(),
            sheets.catalog.clone(),
            sheets.incoming.clone(),
        ));
        let routes = Arc::new(SheetRouteFeed::new(store, sheets.routes.clone()));

        let planner = Arc::new(AvailabilityPlanner::new(
            ledger.clone(),
            catalog,
            routes,
            PlannerCaches::in_memory(clock.clone()),
            PlannerSettings::from(config),
        ));
        let controller = Arc::new(OrderController::new(planner.clone(), ledger));

        tracing::info!(
            offset = %config.utc_offset,
            horizon_days = config.horizon_days,
            candidate_count = config.candidate_count,
            "engine ready"
        );
        Ok(Self {
            planner,
            controller,
            clock,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
