use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use larder_core::{OrderId, Sku};
use larder_infra::{DateCandidate, OrderReceipt};
use larder_inventory::{AvailabilitySnapshot, Reservation, ReservationLine};
use larder_orders::{CartLine, ClientInfo, OrderSummary};
use larder_routes::RouteQuery;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// A SKU code as sent by clients: text or a bare number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Code {
    Text(String),
    Number(serde_json::Number),
}

impl Code {
    fn as_text(&self) -> String {
        match self {
            Code::Text(s) => s.clone(),
            Code::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeliveryDatesQuery {
    pub city: Option<String>,
    pub route: Option<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub sku: Code,
    #[serde(default)]
    pub dates: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CartLineRequest {
    pub sku: Code,
    #[serde(alias = "quantity")]
    pub qty: i64,
}

#[derive(Debug, Deserialize)]
pub struct CandidatesRequest {
    pub city: Option<String>,
    pub route: Option<String>,
    #[serde(default)]
    pub cart: Vec<CartLineRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub city: Option<String>,
    pub route: Option<String>,
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub cart: Vec<CartLineRequest>,
    pub client: Option<ClientInfo>,
    pub total: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ReservationsQuery {
    pub sku: Option<String>,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn route_query(city: Option<String>, route: Option<String>) -> RouteQuery {
    let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    RouteQuery {
        city: present(city),
        route: present(route),
    }
}

pub fn parse_sku(code: &str) -> Result<Sku, axum::response::Response> {
    code.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_sku", "sku must not be empty"))
}

pub fn parse_date(text: &str) -> Result<NaiveDate, axum::response::Response> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_date",
            format!("{text:?} is not a YYYY-MM-DD date"),
        )
    })
}

pub fn parse_dates(texts: &[String]) -> Result<Vec<NaiveDate>, axum::response::Response> {
    texts.iter().map(|t| parse_date(t)).collect()
}

pub fn parse_cart(lines: &[CartLineRequest]) -> Result<Vec<CartLine>, axum::response::Response> {
    lines
        .iter()
        .map(|l| -> Result<CartLine, axum::response::Response> {
            Ok(CartLine::new(parse_code(&l.sku)?, l.qty))
        })
        .collect()
}

pub fn parse_code(code: &Code) -> Result<Sku, axum::response::Response> {
    parse_sku(&code.as_text())
}

pub fn parse_order_id(id: &str) -> Result<OrderId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"))
}

// -------------------------
// Response mapping
// -------------------------

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn snapshot_to_json(s: &AvailabilitySnapshot) -> Value {
    json!({
        "date": s.date,
        "projectedAvailable": s.projected_available,
        "status": s.status,
        "hasIncomingOnDate": s.has_incoming_on_date,
    })
}

pub fn candidate_to_json(c: &DateCandidate) -> Value {
    json!({
        "date": c.date,
        "feasible": c.feasible,
        "limitingLine": c.limiting_line.as_ref().map(|l| json!({
            "sku": l.sku,
            "requested": l.requested,
            "available": l.available,
        })),
    })
}

pub fn receipt_to_json(r: &OrderReceipt) -> Value {
    json!({
        "orderId": r.order_id,
        "createdAt": timestamp(r.created_at),
        "expiresAt": timestamp(r.expires_at),
        "deliveryDate": r.delivery_date,
        "status": r.status,
    })
}

fn line_to_json(l: &ReservationLine) -> Value {
    json!({
        "sku": l.sku,
        "description": l.description,
        "qty": l.quantity,
        "unit": l.unit.as_code(),
        "deliveryDate": l.delivery_date,
    })
}

pub fn summary_to_json(s: &OrderSummary) -> Value {
    json!({
        "orderId": s.order_id,
        "status": s.status,
        "createdAt": timestamp(s.created_at),
        "expiresAt": timestamp(s.expires_at),
        "deliveryDate": s.delivery_date,
        "clientName": s.client_name,
        "lines": s.lines.iter().map(line_to_json).collect::<Vec<_>>(),
    })
}

pub fn reservation_to_json(r: &Reservation) -> Value {
    json!({
        "orderId": r.order_id,
        "sku": r.sku,
        "description": r.description,
        "qty": r.quantity,
        "unit": r.unit.as_code(),
        "status": r.status,
        "createdAt": timestamp(r.created_at),
        "expiresAt": timestamp(r.expires_at),
        "deliveryDate": r.delivery_date,
        "clientName": r.client_name,
    })
}
