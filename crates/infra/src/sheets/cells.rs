//! Defensive parsing of individual sheet cells.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use larder_inventory::round_stock;

/// Error values spreadsheets render in place of data.
const SENTINELS: &[&str] = &["#N/A", "#REF!", "#VALUE!", "#ERROR!", "#DIV/0!", "#NAME?", "N/A"];

/// Trimmed cell text, or `None` for blank and error cells.
pub fn clean(cell: &str) -> Option<&str> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(trimmed)) {
        None
    } else {
        Some(trimmed)
    }
}

/// `Date(y,m,d[,h,mi,s])` as emitted by the visualization API; month is zero-based.
fn parse_gviz(text: &str) -> Option<NaiveDateTime> {
    let inner = text.strip_prefix("Date(")?.strip_suffix(')')?;
    let parts: Vec<u32> = inner
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<Vec<_>>>()?;
    let (year, month, day) = match parts.as_slice() {
        [y, m, d, ..] => (*y as i32, *m + 1, *d),
        _ => return None,
    };
    let time = |i: usize| parts.get(i).copied().unwrap_or(0);
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(time(3), time(4), time(5))
}

/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY`, RFC 3339 (date part) and `Date(y,m,d)`.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let text = clean(cell)?;
    if let Some(dt) = parse_gviz(text) {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%d/%m/%Y") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive())
}

/// Accepts RFC 3339, `Date(y,m,d,h,mi,s)` (read as UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    let text = clean(cell)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_gviz(text) {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    parse_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc())
}

/// Number with either `.` or `,` as decimal separator (`1.234,5` is read as 1234.5).
pub fn parse_number(cell: &str) -> Option<f64> {
    let text: String = clean(cell)?.chars().filter(|c| !c.is_whitespace()).collect();
    let normalized = if text.contains(',') && text.contains('.') {
        text.replace('.', "").replace(',', ".")
    } else {
        text.replace(',', ".")
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Strictly positive whole quantity (rounded half-up).
pub fn parse_quantity(cell: &str) -> Option<i64> {
    parse_number(cell).map(round_stock).filter(|q| *q > 0)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
