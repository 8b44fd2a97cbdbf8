//! Availability planner: combines the route calendar, the live ledger and the
//! catalog feeds into delivery-date candidates and stock snapshots.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use larder_core::Sku;
use larder_inventory::{
    AvailabilitySnapshot, IncomingShipment, Reservation, ReservationLine, StockProjector,
};
use larder_orders::{CartLine, consolidate};
use larder_routes::{DateRejection, RouteCalendar, RouteQuery};

use crate::cache::{PlannerCaches, read_through};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::feeds::{CatalogEntry, CatalogFeed, RouteFeed};
use crate::ledger::ReservationLedger;

const ROUTES_KEY: &str = "routes";
const CATALOG_KEY: &str = "catalog";
const SHIPMENTS_KEY: &str = "shipments";

/// Planner knobs taken from [`EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerSettings {
    pub utc_offset: FixedOffset,
    pub horizon_days: u32,
    pub candidate_count: usize,
    pub cache_ttl: Duration,
}

impl From<&EngineConfig> for PlannerSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            utc_offset: config.utc_offset,
            horizon_days: config.horizon_days,
            candidate_count: config.candidate_count,
            cache_ttl: config.cache_ttl,
        }
    }
}

/// The first cart line that cannot be served on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitingLine {
    pub sku: Sku,
    pub requested: i64,
    pub available: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCandidate {
    pub date: NaiveDate,
    pub feasible: bool,
    pub limiting_line: Option<LimitingLine>,
}

/// Ledger, catalog and shipments as seen at one instant.
struct StockView {
    catalog: Arc<Vec<CatalogEntry>>,
    reservations: Vec<Reservation>,
    shipments: Arc<Vec<IncomingShipment>>,
    now: DateTime<Utc>,
}

impl StockView {
    fn projector(&self) -> StockProjector<'_> {
        StockProjector::new(&self.reservations, &self.shipments, self.now)
    }

    fn entry(&self, sku: &Sku) -> EngineResult<&CatalogEntry> {
        self.catalog
            .iter()
            .find(|e| &e.sku == sku)
            .ok_or_else(|| EngineError::validation(format!("unknown sku {sku}")))
    }

    /// First line short on `date`, in cart order.
    fn shortage(&self, cart: &[CartLine], date: NaiveDate) -> EngineResult<Option<LimitingLine>> {
        let projector = self.projector();
        for line in cart {
            let entry = self.entry(&line.sku)?;
            let available = projector.projected_available(&line.sku, entry.base_stock, date);
            if available < line.quantity {
                return Ok(Some(LimitingLine {
                    sku: line.sku.clone(),
                    requested: line.quantity,
                    available,
                }));
            }
        }
        Ok(None)
    }
}

pub struct AvailabilityPlanner {
    ledger: Arc<dyn ReservationLedger>,
    catalog: Arc<dyn CatalogFeed>,
    routes: Arc<dyn RouteFeed>,
    caches: PlannerCaches,
    settings: PlannerSettings,
}

impl AvailabilityPlanner {
    pub fn new(
        ledger: Arc<dyn ReservationLedger>,
        catalog: Arc<dyn CatalogFeed>,
        routes: Arc<dyn RouteFeed>,
        caches: PlannerCaches,
        settings: PlannerSettings,
    ) -> Self {
        Self {
            ledger,
            catalog,
            routes,
            caches,
            settings,
        }
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Calendar over the current route schedules.
    ///
    /// A route feed outage degrades to a stale cached list, then to the
    /// default Monday to Friday schedule.
    pub fn calendar(&self) -> RouteCalendar {
        let loaded = read_through(
            &*self.caches.routes,
            ROUTES_KEY,
            self.settings.cache_ttl,
            || self.routes.schedules().map(Arc::new),
        );
        match loaded {
            Ok(schedules) => RouteCalendar::new((*schedules).clone(), self.settings.utc_offset),
            Err(error) => {
                tracing::warn!(%error, "route feed unavailable; using default schedule");
                RouteCalendar::fallback(self.settings.utc_offset)
            }
        }
    }

    fn catalog_entries(&self) -> EngineResult<Arc<Vec<CatalogEntry>>> {
        Ok(read_through(
            &*self.caches.catalog,
            CATALOG_KEY,
            self.settings.cache_ttl,
            || self.catalog.catalog().map(Arc::new),
        )?)
    }

    fn shipments(&self) -> EngineResult<Arc<Vec<IncomingShipment>>> {
        Ok(read_through(
            &*self.caches.shipments,
            SHIPMENTS_KEY,
            self.settings.cache_ttl,
            || self.catalog.incoming_shipments().map(Arc::new),
        )?)
    }

    fn stock_view(&self, sku: Option<&Sku>, now: DateTime<Utc>) -> EngineResult<StockView> {
        Ok(StockView {
            catalog: self.catalog_entries()?,
            reservations: self.ledger.list_active(sku, now)?,
            shipments: self.shipments()?,
            now,
        })
    }

    /// Expire lapsed holds; failure is logged, never returned.
    pub fn opportunistic_sweep(&self, now: DateTime<Utc>) {
        if let Err(error) = self.ledger.sweep_expired(now) {
            tracing::warn!(%error, "opportunistic sweep failed");
        }
    }

    pub fn next_delivery_dates(
        &self,
        query: &RouteQuery,
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<NaiveDate> {
        self.opportunistic_sweep(now);
        self.calendar()
            .next_dates(query, now, count, self.settings.horizon_days)
    }

    pub fn stock_for_dates(
        &self,
        sku: &Sku,
        dates: &[NaiveDate],
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<AvailabilitySnapshot>> {
        self.opportunistic_sweep(now);
        let view = self.stock_view(Some(sku), now)?;
        let entry = view.entry(sku)?;
        Ok(view.projector().snapshots(sku, entry.base_stock, dates))
    }

    /// The next candidate dates for `query`, each marked feasible or not for
    /// `cart`. Infeasible dates are kept.
    pub fn candidates_with_feasibility(
        &self,
        query: &RouteQuery,
        cart: &[CartLine],
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<DateCandidate>> {
        self.opportunistic_sweep(now);
        let dates = self.calendar().next_dates(
            query,
            now,
            self.settings.candidate_count,
            self.settings.horizon_days,
        );

        if cart.is_empty() {
            return Ok(dates
                .into_iter()
                .map(|date| DateCandidate {
                    date,
                    feasible: true,
                    limiting_line: None,
                })
                .collect());
        }

        let cart = consolidate(cart)?;
        let view = self.stock_view(None, now)?;
        dates
            .into_iter()
            .map(|date| -> EngineResult<DateCandidate> {
                let limiting_line = view.shortage(&cart, date)?;
                Ok(DateCandidate {
                    date,
                    feasible: limiting_line.is_none(),
                    limiting_line,
                })
            })
            .collect()
    }

    /// `Ok` when every line of `cart` fits on `date`, else `StockConflict`
    /// naming the first short line.
    pub fn check_feasibility(
        &self,
        cart: &[CartLine],
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.opportunistic_sweep(now);
        let cart = consolidate(cart)?;
        let view = self.stock_view(None, now)?;
        ensure_fits(&view, &cart, date)
    }

    /// Re-check a consolidated cart against live state and turn it into
    /// ledger lines carrying catalog descriptions. Does not sweep.
    pub fn prepare_lines(
        &self,
        cart: &[CartLine],
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<ReservationLine>> {
        let view = self.stock_view(None, now)?;
        ensure_fits(&view, cart, date)?;
        cart.iter()
            .map(|line| -> EngineResult<ReservationLine> {
                let entry = view.entry(&line.sku)?;
                Ok(ReservationLine::new(
                    line.sku.clone(),
                    entry.description.clone(),
                    line.quantity,
                    date,
                )?)
            })
            .collect()
    }

    /// Whether `date` may be booked: legal for the route when one is given,
    /// otherwise merely not in the past.
    pub fn check_date(
        &self,
        query: &RouteQuery,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let calendar = self.calendar();
        let rejection = if query.is_unspecified() {
            let today = calendar.local_now(now).date();
            (date < today).then_some(DateRejection::InThePast)
        } else {
            calendar.check(query, date, now).err()
        };
        match rejection {
            None => Ok(()),
            Some(reason) => Err(EngineError::validation(format!(
                "delivery date {date} not available: {reason}"
            ))),
        }
    }
}

fn ensure_fits(view: &StockView, cart: &[CartLine], date: NaiveDate) -> EngineResult<()> {
    match view.shortage(cart, date)? {
        None => Ok(()),
        Some(limit) => Err(EngineError::StockConflict {
            sku: limit.sku,
            date,
            requested: limit.requested,
            available: limit.available,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::RwLock;

    use chrono::TimeZone;
    use larder_core::{Clock, ManualClock, OrderId};
    use larder_orders::ClientInfo;
    use larder_routes::RouteSchedule;

    use crate::error::{FeedError, StoreError};
    use crate::ledger::{NewOrder, RowReservationLedger};
    use crate::row_store::InMemoryRowStore;

    #[derive(Default)]
    struct StubFeeds {
        catalog: RwLock<Option<Vec<CatalogEntry>>>,
        shipments: RwLock<Vec<IncomingShipment>>,
        routes: RwLock<Option<Vec<RouteSchedule>>>,
    }

    fn outage() -> FeedError {
        FeedError::Store(StoreError::Unavailable("stub outage".into()))
    }

    impl CatalogFeed for StubFeeds {
        fn catalog(&self) -> Result<Vec<CatalogEntry>, FeedError> {
            self.catalog.read().unwrap().clone().ok_or_else(outage)
        }

        fn incoming_shipments(&self) -> Result<Vec<IncomingShipment>, FeedError> {
            Ok(self.shipments.read().unwrap().clone())
        }
    }

    impl RouteFeed for StubFeeds {
        fn schedules(&self) -> Result<Vec<RouteSchedule>, FeedError> {
            self.routes.read().unwrap().clone().ok_or_else(outage)
        }
    }

    struct Harness {
        clock: Arc<ManualClock>,
        feeds: Arc<StubFeeds>,
        ledger: Arc<RowReservationLedger<Arc<InMemoryRowStore>>>,
        planner: AvailabilityPlanner,
    }

    fn sku(code: &str) -> Sku {
        code.parse().unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    // Wednesday 2025-01-08, 09:00 at -03:00.
    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap()));
        let feeds = Arc::new(StubFeeds::default());
        *feeds.catalog.write().unwrap() = Some(vec![CatalogEntry {
            sku: sku("100"),
            description: "Costela".into(),
            base_stock: 10.0,
        }]);
        *feeds.routes.write().unwrap() = Some(vec![RouteSchedule::from_text(
            "R1",
            "Pelotas",
            "segunda, quarta, sexta",
            "17:30",
        )]);

        let ledger = Arc::new(RowReservationLedger::new(
            Arc::new(InMemoryRowStore::new()),
            "RESERVATIONS",
            "ORDERS",
        ));
        let planner = AvailabilityPlanner::new(
            ledger.clone(),
            feeds.clone(),
            feeds.clone(),
            PlannerCaches::in_memory(clock.clone() as Arc<dyn Clock>),
            PlannerSettings::from(&EngineConfig::default()),
        );
        Harness {
            clock,
            feeds,
            ledger,
            planner,
        }
    }

    fn hold(h: &Harness, code: &str, qty: i64, date: NaiveDate) {
        let line = ReservationLine::new(sku(code), "x", qty, date).unwrap();
        h.ledger
            .add(&NewOrder {
                order_id: OrderId::generate(),
                lines: vec![line],
                client: ClientInfo::default(),
                total: None,
                created_at: h.clock.now(),
            })
            .unwrap();
    }

    #[test]
    fn stock_for_dates_projects_holds_and_shipments() {
        let h = harness();
        hold(&h, "100", 7, day(10));
        *h.feeds.shipments.write().unwrap() = vec![IncomingShipment::new(sku("100"), 5, day(9)).unwrap()];

        let snaps = h
            .planner
            .stock_for_dates(&sku("100"), &[day(8), day(9), day(10)], h.clock.now())
            .unwrap();
        let available: Vec<i64> = snaps.iter().map(|s| s.projected_available).collect();
        assert_eq!(available, vec![10, 15, 8]);
        assert!(snaps[1].has_incoming_on_date);
    }

    #[test]
    fn unknown_sku_is_validation_error() {
        let h = harness();
        let err = h.planner.stock_for_dates(&sku("999"), &[day(9)], h.clock.now()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn candidates_follow_route_and_mark_shortages() {
        let h = harness();
        hold(&h, "100", 8, day(8));
        *h.feeds.shipments.write().unwrap() = vec![IncomingShipment::new(sku("100"), 3, day(10)).unwrap()];

        let cart = [CartLine::new(sku("100"), 3)];
        let candidates = h
            .planner
            .candidates_with_feasibility(&RouteQuery::route("R1"), &cart, h.clock.now())
            .unwrap();

        let dates: Vec<NaiveDate> = candidates.iter().map(|c| c.date).collect();
        assert_eq!(dates, vec![day(8), day(10), day(13), day(15), day(17)]);
        assert!(!candidates[0].feasible);
        assert_eq!(
            candidates[0].limiting_line,
            Some(LimitingLine {
                sku: sku("100"),
                requested: 3,
                available: 2
            })
        );
        assert!(candidates[1].feasible);
    }

    #[test]
    fn empty_cart_is_feasible_everywhere() {
        let h = harness();
        *h.feeds.catalog.write().unwrap() = None;
        let candidates = h
            .planner
            .candidates_with_feasibility(&RouteQuery::default(), &[], h.clock.now())
            .unwrap();
        assert_eq!(candidates.len(), 5);
        assert!(candidates.iter().all(|c| c.feasible));
    }

    #[test]
    fn check_feasibility_merges_repeated_skus() {
        let h = harness();
        let cart = [CartLine::new(sku("100"), 6), CartLine::new(sku("100"), 5)];
        let err = h.planner.check_feasibility(&cart, day(9), h.clock.now()).unwrap_err();
        assert!(matches!(err, EngineError::StockConflict { requested: 11, available: 10, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn route_outage_uses_stale_cache_then_default() {
        let h = harness();
        let query = RouteQuery::route("R1");
        let now = h.clock.now();
        assert_eq!(h.planner.next_delivery_dates(&query, 2, now), vec![day(8), day(10)]);

        *h.feeds.routes.write().unwrap() = None;
        h.clock.advance(Duration::minutes(10));
        let now = h.clock.now();
        assert_eq!(h.planner.next_delivery_dates(&query, 2, now), vec![day(8), day(10)]);

        let fresh = harness();
        *fresh.feeds.routes.write().unwrap() = None;
        let now = fresh.clock.now();
        assert_eq!(fresh.planner.next_delivery_dates(&query, 2, now), vec![day(8), day(9)]);
    }

    #[test]
    fn catalog_outage_without_cache_is_upstream_unavailable() {
        let h = harness();
        *h.feeds.catalog.write().unwrap() = None;
        let err = h.planner.stock_for_dates(&sku("100"), &[day(9)], h.clock.now()).unwrap_err();
        assert!(matches!(err, EngineError::UpstreamUnavailable(_)));
    }

    #[test]
    fn catalog_is_cached_within_ttl() {
        let h = harness();
        h.planner.stock_for_dates(&sku("100"), &[day(9)], h.clock.now()).unwrap();
        *h.feeds.catalog.write().unwrap() = None;
        h.clock.advance(Duration::minutes(4));
        assert!(h.planner.stock_for_dates(&sku("100"), &[day(9)], h.clock.now()).is_ok());
    }

    #[test]
    fn check_date_without_route_only_rejects_the_past() {
        let h = harness();
        let now = h.clock.now();
        // Saturday is fine when no route is named.
        assert!(h.planner.check_date(&RouteQuery::default(), day(11), now).is_ok());
        assert!(h.planner.check_date(&RouteQuery::default(), day(7), now).is_err());

        let err = h.planner.check_date(&RouteQuery::route("R1"), day(9), now).unwrap_err();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("2025-01-09")));
    }
}
