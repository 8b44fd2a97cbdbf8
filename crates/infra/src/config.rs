//! Engine configuration read from `LARDER_*` environment variables.

use chrono::{Duration, FixedOffset, Offset, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Sheet names of the row store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNames {
    pub reservations: String,
    pub orders: String,
    pub catalog: String,
    pub incoming: String,
    pub routes: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            reservations: "RESERVATIONS".to_string(),
            orders: "ORDERS".to_string(),
            catalog: "CATALOG".to_string(),
            incoming: "INCOMING".to_string(),
            routes: "ROUTES".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Route-local offset used for every calendar comparison.
    pub utc_offset: FixedOffset,
    /// Days walked forward when looking for delivery dates.
    pub horizon_days: u32,
    /// Dates offered by the candidate search.
    pub candidate_count: usize,
    /// TTL of cached feed reads.
    pub cache_ttl: Duration,
    pub sheets: SheetNames,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_offset(),
            horizon_days: 60,
            candidate_count: 5,
            cache_ttl: Duration::seconds(300),
            sheets: SheetNames::default(),
        }
    }
}

fn default_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap_or_else(|| Utc.fix())
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let utc_offset = match get("LARDER_UTC_OFFSET") {
            Some(v) => parse_offset(&v).ok_or_else(|| invalid("LARDER_UTC_OFFSET", &v, "expected ±HH:MM"))?,
            None => defaults.utc_offset,
        };
        let horizon_days = match get("LARDER_HORIZON_DAYS") {
            Some(v) => parse_positive::<u32>("LARDER_HORIZON_DAYS", &v)?,
            None => defaults.horizon_days,
        };
        let candidate_count = match get("LARDER_CANDIDATE_COUNT") {
            Some(v) => parse_positive::<usize>("LARDER_CANDIDATE_COUNT", &v)?,
            None => defaults.candidate_count,
        };
        let cache_ttl = match get("LARDER_CACHE_TTL_SECS") {
            Some(v) => Duration::seconds(parse_positive::<i64>("LARDER_CACHE_TTL_SECS", &v)?),
            None => defaults.cache_ttl,
        };

        let sheet = |key: &str, default: String| get(key).map(|v| v.trim().to_string()).unwrap_or(default);
        let d = defaults.sheets;
        let sheets = SheetNames {
            reservations: sheet("LARDER_SHEET_RESERVATIONS", d.reservations),
            orders: sheet("LARDER_SHEET_ORDERS", d.orders),
            catalog: sheet("LARDER_SHEET_CATALOG", d.catalog),
            incoming: sheet("LARDER_SHEET_INCOMING", d.incoming),
            routes: sheet("LARDER_SHEET_ROUTES", d.routes),
        };

        Ok(Self {
            utc_offset,
            horizon_days,
            candidate_count,
            cache_ttl,
            sheets,
        })
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_positive<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let parsed: T = value.trim().parse().map_err(|e: T::Err| invalid(key, value, e.to_string()))?;
    if parsed <= T::default() {
        return Err(invalid(key, value, "must be positive"));
    }
    Ok(parsed)
}

/// Parse `-03:00`, `+0530`, `-3`, `Z` or `UTC`.
pub fn parse_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
