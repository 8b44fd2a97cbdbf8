//! Reservation ledger rows: one row per held cart line.

use larder_core::{OrderId, Sku, UnitKind};
use larder_inventory::{Reservation, ReservationStatus, expiry_for};

use super::cells::{clean, format_date, format_timestamp, parse_date, parse_quantity, parse_timestamp};
use super::{Column, HeaderMap, SheetLayout};

pub const ORDER_ID: usize = 0;
pub const CREATED_AT: usize = 1;
pub const EXPIRES_AT: usize = 2;
pub const STATUS: usize = 3;
pub const DELIVERY_DATE: usize = 4;
pub const SKU: usize = 5;
pub const DESCRIPTION: usize = 6;
pub const QTY: usize = 7;
pub const UNIT: usize = 8;
pub const CLIENT_NAME: usize = 9;

pub const LAYOUT: SheetLayout = SheetLayout {
    columns: &[
        Column::new("orderId", &["pedido"]),
        Column::new("createdAt", &["criadoEm"]),
        Column::new("expiresAt", &["expiraEm"]),
        Column::new("status", &[]),
        Column::new("deliveryDate", &["dataEntrega"]),
        Column::new("sku", &["codigo"]),
        Column::new("description", &["descricao"]),
        Column::new("qty", &["quantidade", "quantity"]),
        Column::new("unit", &["unidade"]),
        Column::new("clientName", &["clientNome", "cliente"]),
    ],
};

pub fn encode(map: &HeaderMap, r: &Reservation) -> Vec<String> {
    map.build_row(vec![
        r.order_id.to_string(),
        format_timestamp(r.created_at),
        format_timestamp(r.expires_at),
        r.status.as_code().to_string(),
        format_date(r.delivery_date),
        r.sku.to_string(),
        r.description.clone(),
        r.quantity.to_string(),
        r.unit.as_code().to_string(),
        r.client_name.clone(),
    ])
}

pub fn decode(map: &HeaderMap, row: &[String]) -> Result<Reservation, String> {
    let required = |column: usize, what: &str| {
        clean(map.cell(row, column))
            .ok_or_else(|| format!("missing {what}"))
    };

    let order_id: OrderId = required(ORDER_ID, "orderId")?
        .parse()
        .map_err(|_| "bad orderId".to_string())?;
    let created_at = parse_timestamp(map.cell(row, CREATED_AT)).ok_or("bad createdAt")?;
    let expires_at = parse_timestamp(map.cell(row, EXPIRES_AT)).unwrap_or_else(|| expiry_for(created_at));
    let status = ReservationStatus::from_code(map.cell(row, STATUS))
        .ok_or_else(|| format!("unknown status {:?}", map.cell(row, STATUS)))?;
    let delivery_date = parse_date(map.cell(row, DELIVERY_DATE)).ok_or("bad deliveryDate")?;
    let sku: Sku = required(SKU, "sku")?
        .parse()
        .map_err(|_| "bad sku".to_string())?;
    let quantity = parse_quantity(map.cell(row, QTY)).ok_or("bad qty")?;
    let unit = UnitKind::from_code(map.cell(row, UNIT)).unwrap_or_else(|| sku.unit_kind());

    Ok(Reservation {
        order_id,
        description: clean(map.cell(row, DESCRIPTION)).unwrap_or("").to_string(),
        quantity,
        unit,
        client_name: clean(map.cell(row, CLIENT_NAME)).unwrap_or("").to_string(),
        created_at,
        expires_at,
        delivery_date,
        status,
        sku,
    })
}
