//! Order header rows: one row per order, mirroring the status of its lines.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use larder_core::OrderId;
use larder_inventory::ReservationStatus;
use larder_orders::ClientInfo;

use super::cells::{clean, format_date, format_timestamp};
use super::{Column, HeaderMap, SheetLayout};

pub const ORDER_ID: usize = 0;
pub const CREATED_AT: usize = 1;
pub const DELIVERY_DATE: usize = 2;
pub const STATUS: usize = 3;
pub const ORIGIN: usize = 4;
pub const CLIENT_NAME: usize = 5;
pub const CLIENT_DOCUMENT: usize = 6;
pub const CLIENT_PHONE: usize = 7;
pub const CLIENT_EMAIL: usize = 8;
pub const TOTAL: usize = 9;

pub const LAYOUT: SheetLayout = SheetLayout {
    columns: &[
        Column::new("orderId", &["pedido"]),
        Column::new("createdAt", &["criadoEm"]),
        Column::new("deliveryDate", &["dataEntrega"]),
        Column::new("status", &[]),
        Column::new("origin", &["origem"]),
        Column::new("clientName", &["clientNome", "cliente"]),
        Column::new("clientDocument", &["clientCnpjCpf", "cnpjCpf"]),
        Column::new("clientPhone", &["clientTelefone", "telefone"]),
        Column::new("clientEmail", &["email"]),
        Column::new("total", &[]),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub order_id: OrderId,
    pub created_at: DateTime<Utc>,
    pub delivery_date: NaiveDate,
    pub status: ReservationStatus,
    pub client: ClientInfo,
    pub total: Option<f64>,
}

pub fn encode(map: &HeaderMap, h: &OrderHeader) -> Vec<String> {
    map.build_row(vec![
        h.order_id.to_string(),
        format_timestamp(h.created_at),
        format_date(h.delivery_date),
        h.status.as_code().to_string(),
        h.client.origin.clone(),
        h.client.name.clone(),
        h.client.document.clone(),
        h.client.phone.clone(),
        h.client.email.clone(),
        h.total.map(|t| format!("{t:.2}")).unwrap_or_default(),
    ])
}

/// Order id of a header row, if readable.
pub fn order_id_of(map: &HeaderMap, row: &[String]) -> Option<OrderId> {
    clean(map.cell(row, ORDER_ID))?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encodes_client_details_and_total() {
        let header = OrderHeader {
            order_id: "ORD-9".parse().unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 8, 15, 0, 0).unwrap(),
            delivery_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            status: ReservationStatus::Held,
            client: ClientInfo {
                name: "Mercado Central".into(),
                document: "12.345.678/0001-90".into(),
                phone: "55 99999-0000".into(),
                email: "compras@mercado.test".into(),
                origin: "app".into(),
            },
            total: Some(152.5),
        };
        let map = HeaderMap::canonical(&LAYOUT);
        let row = encode(&map, &header);
        assert_eq!(row[STATUS], "HELD");
        assert_eq!(row[TOTAL], "152.50");
        assert_eq!(row[CLIENT_DOCUMENT], "12.345.678/0001-90");
        assert_eq!(order_id_of(&map, &row), Some(header.order_id));
    }
}
