use serde::{Deserialize, Serialize};

use crate::cutoff::CutoffTime;
use crate::text::normalize;
use crate::weekday::{WeekdaySet, parse_weekdays};

/// One row of the route sheet: a route serving a city on some weekdays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSchedule {
    pub route_id: String,
    pub city: String,
    /// Weekday text as typed in the sheet (kept for diagnostics).
    pub days_text: String,
    pub allowed_weekdays: WeekdaySet,
    pub cutoff: CutoffTime,
}

impl RouteSchedule {
    /// Build a schedule from the raw sheet cells.
    pub fn from_text(
        route_id: impl Into<String>,
        city: impl Into<String>,
        days_text: impl Into<String>,
        cutoff_text: &str,
    ) -> Self {
        let days_text = days_text.into();
        Self {
            route_id: route_id.into().trim().to_string(),
            city: city.into().trim().to_string(),
            allowed_weekdays: parse_weekdays(&days_text),
            days_text,
            cutoff: CutoffTime::parse_or_default(cutoff_text),
        }
    }

    pub(crate) fn serves_city(&self, normalized_city: &str) -> bool {
        !normalized_city.is_empty() && normalize(&self.city) == normalized_city
    }
}

/// Which route(s) a caller is asking about.
///
/// A city takes precedence; the route id is the fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub city: Option<String>,
    pub route: Option<String>,
}

impl RouteQuery {
    pub fn city(city: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
            route: None,
        }
    }

    pub fn route(route: impl Into<String>) -> Self {
        Self {
            city: None,
            route: Some(route.into()),
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Whether neither a city nor a route id was supplied.
    pub fn is_unspecified(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        blank(&self.city) && blank(&self.route)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Union of every route serving the requested city.
    City,
    /// A single route matched by id.
    Route,
    /// Nothing matched; Monday–Friday with the default cutoff.
    Default,
}

/// Effective weekday set and cutoff after resolving a `RouteQuery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSchedule {
    pub allowed_weekdays: WeekdaySet,
    pub cutoff: CutoffTime,
    pub matched_routes: Vec<String>,
    pub source: ResolutionSource,
}

impl ResolvedSchedule {
    pub fn fallback() -> Self {
        Self {
            allowed_weekdays: WeekdaySet::business_days(),
            cutoff: CutoffTime::DEFAULT,
            matched_routes: Vec::new(),
            source: ResolutionSource::Default,
        }
    }
}
