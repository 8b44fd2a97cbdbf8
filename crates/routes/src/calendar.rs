use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cutoff::CutoffTime;
use crate::schedule::{ResolutionSource, ResolvedSchedule, RouteQuery, RouteSchedule};
use crate::text::normalize;
use crate::weekday::WeekdaySet;

/// Why a date is not a legal delivery date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DateRejection {
    InThePast,
    WeekdayNotServed { weekday: u32 },
    CutoffPassed { cutoff: CutoffTime },
}

impl core::fmt::Display for DateRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DateRejection::InThePast => f.write_str("date is in the past"),
            DateRejection::WeekdayNotServed { weekday } => {
                write!(f, "weekday {weekday} is not served by this route")
            }
            DateRejection::CutoffPassed { cutoff } => {
                write!(f, "order cutoff ({cutoff}) has passed for today")
            }
        }
    }
}

impl ResolvedSchedule {
    /// Check one date against this schedule. `local_now` must already be in
    /// route-local time.
    pub fn check(&self, date: NaiveDate, local_now: NaiveDateTime) -> Result<(), DateRejection> {
        let today = local_now.date();
        if date < today {
            return Err(DateRejection::InThePast);
        }
        if !self.allowed_weekdays.contains(date.weekday()) {
            return Err(DateRejection::WeekdayNotServed {
                weekday: date.weekday().num_days_from_sunday(),
            });
        }
        if date == today && self.cutoff.has_passed(local_now.time()) {
            return Err(DateRejection::CutoffPassed {
                cutoff: self.cutoff,
            });
        }
        Ok(())
    }
}

/// Route schedules plus the route-local UTC offset used for every comparison.
#[derive(Debug, Clone)]
pub struct RouteCalendar {
    schedules: Vec<RouteSchedule>,
    offset: FixedOffset,
}

impl RouteCalendar {
    pub fn new(schedules: Vec<RouteSchedule>, offset: FixedOffset) -> Self {
        Self { schedules, offset }
    }

    /// Calendar with no route rows: every query resolves to the default schedule.
    pub fn fallback(offset: FixedOffset) -> Self {
        Self::new(Vec::new(), offset)
    }

    pub fn schedules(&self) -> &[RouteSchedule] {
        &self.schedules
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// `now` expressed as route-local wall-clock time.
    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.offset).naive_local()
    }

    /// Resolve a query to an effective schedule.
    ///
    /// City match unions the weekdays of every route serving the city and uses
    /// the first matching route's cutoff. Route ids match exactly first, then
    /// by containment.
    pub fn resolve(&self, query: &RouteQuery) -> ResolvedSchedule {
        if let Some(city) = query.city.as_deref().map(normalize).filter(|c| !c.is_empty()) {
            let matching: Vec<&RouteSchedule> =
                self.schedules.iter().filter(|s| s.serves_city(&city)).collect();

            if let Some(first) = matching.first() {
                let allowed = matching
                    .iter()
                    .fold(WeekdaySet::empty(), |acc, s| acc.union(s.allowed_weekdays));
                tracing::debug!(
                    city = %city,
                    routes = matching.len(),
                    weekdays = ?Vec::<u32>::from(allowed),
                    "resolved schedule by city"
                );
                return ResolvedSchedule {
                    allowed_weekdays: allowed,
                    cutoff: first.cutoff,
                    matched_routes: matching.iter().map(|s| s.route_id.clone()).collect(),
                    source: ResolutionSource::City,
                };
            }
        }

        if let Some(route) = query.route.as_deref().map(normalize).filter(|r| !r.is_empty()) {
            let matched = self
                .schedules
                .iter()
                .find(|s| normalize(&s.route_id) == route)
                .or_else(|| {
                    self.schedules
                        .iter()
                        .find(|s| normalize(&s.route_id).contains(&route))
                });

            if let Some(s) = matched {
                tracing::debug!(route = %s.route_id, "resolved schedule by route id");
                return ResolvedSchedule {
                    allowed_weekdays: s.allowed_weekdays,
                    cutoff: s.cutoff,
                    matched_routes: vec![s.route_id.clone()],
                    source: ResolutionSource::Route,
                };
            }
        }

        ResolvedSchedule::fallback()
    }

    pub fn allowed_weekdays(&self, query: &RouteQuery) -> WeekdaySet {
        self.resolve(query).allowed_weekdays
    }

    pub fn cutoff(&self, query: &RouteQuery) -> CutoffTime {
        self.resolve(query).cutoff
    }

    pub fn check(
        &self,
        query: &RouteQuery,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(), DateRejection> {
        self.resolve(query).check(date, self.local_now(now))
    }

    pub fn is_legal_date(&self, query: &RouteQuery, date: NaiveDate, now: DateTime<Utc>) -> bool {
        self.check(query, date, now).is_ok()
    }

    /// First `count` legal dates starting from today (route-local), looking at
    /// most `horizon_days` calendar days ahead.
    pub fn next_dates(
        &self,
        query: &RouteQuery,
        now: DateTime<Utc>,
        count: usize,
        horizon_days: u32,
    ) -> Vec<NaiveDate> {
        let schedule = self.resolve(query);
        let local_now = self.local_now(now);
        let today = local_now.date();

        today
            .iter_days()
            .take(horizon_days as usize)
            .filter(|d| schedule.check(*d, local_now).is_ok())
            .take(count)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Weekday};
    use proptest::prelude::*;

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        brt()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar() -> RouteCalendar {
        RouteCalendar::new(
            vec![
                RouteSchedule::from_text("Missões 1", "Santo Ângelo", "Segunda, Quarta, Sexta", "17:30"),
                RouteSchedule::from_text("Missões 2", "santo angelo", "Terça", "12:00"),
                RouteSchedule::from_text("Celeiro", "Três Passos", "Quinta", "10h"),
            ],
            brt(),
        )
    }

    #[test]
    fn wednesday_after_cutoff_is_rejected() {
        let cal = calendar();
        let q = RouteQuery::route("Missões 1");
        // 2025-01-08 is a Wednesday.
        let now = local(2025, 1, 8, 18, 0);

        assert_eq!(
            cal.check(&q, date(2025, 1, 8), now),
            Err(DateRejection::CutoffPassed {
                cutoff: CutoffTime::DEFAULT
            })
        );
        assert_eq!(
            cal.check(&q, date(2025, 1, 9), now),
            Err(DateRejection::WeekdayNotServed { weekday: 4 })
        );
        assert!(cal.is_legal_date(&q, date(2025, 1, 10), now));
    }

    #[test]
    fn same_day_before_cutoff_is_legal() {
        let cal = calendar();
        let q = RouteQuery::route("Missões 1");
        assert!(cal.is_legal_date(&q, date(2025, 1, 8), local(2025, 1, 8, 17, 29)));
        assert!(!cal.is_legal_date(&q, date(2025, 1, 8), local(2025, 1, 8, 17, 30)));
    }

    #[test]
    fn cutoff_uses_route_local_time() {
        let cal = calendar();
        let q = RouteQuery::route("Missões 1");
        // 19:00 UTC is 16:00 in UTC-3: still before the 17:30 cutoff.
        let now = Utc.with_ymd_and_hms(2025, 1, 8, 19, 0, 0).unwrap();
        assert!(cal.is_legal_date(&q, date(2025, 1, 8), now));
        // 01:00 UTC on the 9th is still the 8th locally, after cutoff.
        let late = Utc.with_ymd_and_hms(2025, 1, 9, 1, 0, 0).unwrap();
        assert_eq!(cal.local_now(late).date(), date(2025, 1, 8));
        assert!(!cal.is_legal_date(&q, date(2025, 1, 8), late));
    }

    #[test]
    fn city_resolution_unions_weekdays_and_takes_first_cutoff() {
        let cal = calendar();
        let resolved = cal.resolve(&RouteQuery::city("SANTO ANGELO"));

        assert_eq!(resolved.source, ResolutionSource::City);
        assert_eq!(Vec::<u32>::from(resolved.allowed_weekdays), vec![1, 2, 3, 5]);
        assert_eq!(resolved.cutoff, CutoffTime::DEFAULT);
        assert_eq!(resolved.matched_routes, vec!["Missões 1", "Missões 2"]);
    }

    #[test]
    fn route_falls_back_to_containment_then_default() {
        let cal = calendar();
        let resolved = cal.resolve(&RouteQuery::route("celeiro"));
        assert_eq!(resolved.source, ResolutionSource::Route);
        assert_eq!(resolved.cutoff, CutoffTime::new(10, 0).unwrap());

        let contained = cal.resolve(&RouteQuery::route("Missões"));
        assert_eq!(contained.matched_routes, vec!["Missões 1"]);

        let unknown = cal.resolve(&RouteQuery::city("Porto Alegre").with_route("Fronteira"));
        assert_eq!(unknown, ResolvedSchedule::fallback());
    }

    #[test]
    fn unknown_city_falls_through_to_route() {
        let cal = calendar();
        let resolved = cal.resolve(&RouteQuery::city("Ijuí").with_route("Celeiro"));
        assert_eq!(resolved.source, ResolutionSource::Route);
    }

    #[test]
    fn past_dates_are_never_legal() {
        let cal = calendar();
        let q = RouteQuery::route("Missões 1");
        assert_eq!(
            cal.check(&q, date(2025, 1, 6), local(2025, 1, 8, 8, 0)),
            Err(DateRejection::InThePast)
        );
    }

    #[test]
    fn next_dates_skip_today_after_cutoff() {
        let cal = calendar();
        let dates = cal.next_dates(&RouteQuery::route("Missões 1"), local(2025, 1, 8, 18, 0), 3, 60);
        assert_eq!(dates, vec![date(2025, 1, 10), date(2025, 1, 13), date(2025, 1, 15)]);
    }

    #[test]
    fn next_dates_include_today_before_cutoff() {
        let cal = calendar();
        let dates = cal.next_dates(&RouteQuery::route("Missões 1"), local(2025, 1, 8, 9, 0), 2, 60);
        assert_eq!(dates, vec![date(2025, 1, 8), date(2025, 1, 10)]);
    }

    #[test]
    fn next_dates_stop_at_horizon() {
        let cal = calendar();
        // Thursday-only route, six days of horizon starting Wednesday: one hit.
        let dates = cal.next_dates(&RouteQuery::route("Celeiro"), local(2025, 1, 8, 9, 0), 5, 6);
        assert_eq!(dates, vec![date(2025, 1, 9)]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: upcoming dates are strictly increasing, each legal, and
        /// exactly `count` long when the horizon is wide enough.
        #[test]
        fn next_dates_are_legal_and_increasing(
            hours in 0i64..(24 * 14),
            count in 1usize..8,
            route in prop::sample::select(vec!["Missões 1", "Missões 2", "Celeiro", "desconhecida"]),
        ) {
            let cal = calendar();
            let query = RouteQuery::route(route);
            let now = local(2025, 1, 6, 0, 0) + Duration::hours(hours);
            let dates = cal.next_dates(&query, now, count, 60);

            prop_assert_eq!(dates.len(), count);
            for pair in dates.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            for d in &dates {
                prop_assert!(cal.is_legal_date(&query, *d, now));
            }
        }

        /// Property: a future date on an allowed weekday is legal regardless of
        /// the time of day `now` falls on.
        #[test]
        fn future_allowed_dates_ignore_cutoff(
            days_ahead in 1i64..60,
            minutes in 0i64..(24 * 60),
            mask in 1u8..128,
        ) {
            let allowed: WeekdaySet = (0..7u32)
                .filter(|n| mask & (1 << n) != 0)
                .map(|n| Weekday::try_from(((n + 6) % 7) as u8).unwrap())
                .collect();
            let schedule = ResolvedSchedule {
                allowed_weekdays: allowed,
                cutoff: CutoffTime::DEFAULT,
                matched_routes: vec![],
                source: ResolutionSource::Route,
            };
            let now = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap().and_hms_opt(0, 0, 0).unwrap()
                + Duration::minutes(minutes);
            let target = now.date() + Duration::days(days_ahead);

            let result = schedule.check(target, now);
            prop_assert_eq!(result.is_ok(), allowed.contains(target.weekday()));
        }
    }
}
