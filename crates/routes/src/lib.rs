//! Route calendar: which calendar dates are legal delivery dates for a route.
//!
//! Pure domain logic. Route rows are parsed from free text (weekday names and
//! cutoff times as typed into the route sheet) and resolved by city or route id.

pub mod calendar;
pub mod cutoff;
pub mod schedule;
pub mod text;
pub mod weekday;

pub use calendar::{DateRejection, RouteCalendar};
pub use cutoff::CutoffTime;
pub use schedule::{ResolutionSource, ResolvedSchedule, RouteQuery, RouteSchedule};
pub use weekday::{WeekdaySet, parse_weekdays};
