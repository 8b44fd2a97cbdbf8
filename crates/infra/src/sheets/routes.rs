//! Route rows: `[routeId, city, daysText, cutoffText]`.

use larder_routes::RouteSchedule;

use super::cells::clean;
use super::{Column, HeaderMap, SheetLayout};

pub const ROUTE_ID: usize = 0;
pub const CITY: usize = 1;
pub const DAYS: usize = 2;
pub const CUTOFF: usize = 3;

pub const LAYOUT: SheetLayout = SheetLayout {
    columns: &[
        Column::new("routeId", &["rota", "route"]),
        Column::new("city", &["cidade"]),
        Column::new("daysText", &["dias", "days", "diasEntrega"]),
        Column::new("cutoffText", &["horarioCorte", "corte", "cutoff"]),
    ],
};

/// A row needs a route id or a city; day and cutoff text fall back to defaults.
pub fn decode(map: &HeaderMap, row: &[String]) -> Result<RouteSchedule, String> {
    let route_id = clean(map.cell(row, ROUTE_ID)).unwrap_or("");
    let city = clean(map.cell(row, CITY)).unwrap_or("");
    if route_id.is_empty() && city.is_empty() {
        return Err("route without id or city".to_string());
    }
    Ok(RouteSchedule::from_text(
        route_id,
        city,
        clean(map.cell(row, DAYS)).unwrap_or(""),
        clean(map.cell(row, CUTOFF)).unwrap_or(""),
    ))
}
