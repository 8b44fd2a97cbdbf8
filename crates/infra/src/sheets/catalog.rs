//! Catalog (`[sku, description, stock]`) and incoming shipment
//! (`[arrivalDate, sku, qty]`) rows.

use larder_core::Sku;
use larder_inventory::IncomingShipment;

use crate::feeds::CatalogEntry;

use super::cells::{clean, parse_date, parse_number, parse_quantity};
use super::{Column, HeaderMap, SheetLayout};

pub const CATALOG_SKU: usize = 0;
pub const CATALOG_DESCRIPTION: usize = 1;
pub const CATALOG_STOCK: usize = 2;

pub const CATALOG_LAYOUT: SheetLayout = SheetLayout {
    columns: &[
        Column::new("sku", &["codigo", "code"]),
        Column::new("description", &["descricao", "nome", "name"]),
        Column::new("stock", &["estoque", "qty"]),
    ],
};

pub const INCOMING_DATE: usize = 0;
pub const INCOMING_SKU: usize = 1;
pub const INCOMING_QTY: usize = 2;

pub const INCOMING_LAYOUT: SheetLayout = SheetLayout {
    columns: &[
        Column::new("arrivalDate", &["data", "date", "dataChegada"]),
        Column::new("sku", &["codigo", "code"]),
        Column::new("qty", &["quantidade", "quantity"]),
    ],
};

fn sku_of(map: &HeaderMap, row: &[String], column: usize) -> Result<Sku, String> {
    clean(map.cell(row, column))
        .ok_or("missing sku")?
        .parse()
        .map_err(|_| "bad sku".to_string())
}

/// Blank stock reads as zero; text that is not a number skips the row.
pub fn decode_catalog(map: &HeaderMap, row: &[String]) -> Result<CatalogEntry, String> {
    let sku = sku_of(map, row, CATALOG_SKU)?;
    let stock_cell = map.cell(row, CATALOG_STOCK);
    let base_stock = match clean(stock_cell) {
        None => 0.0,
        Some(_) => parse_number(stock_cell).ok_or("bad stock")?,
    };
    Ok(CatalogEntry {
        sku,
        description: clean(map.cell(row, CATALOG_DESCRIPTION)).unwrap_or("").to_string(),
        base_stock,
    })
}

pub fn decode_incoming(map: &HeaderMap, row: &[String]) -> Result<IncomingShipment, String> {
    let arrival_date = parse_date(map.cell(row, INCOMING_DATE)).ok_or("bad arrivalDate")?;
    let sku = sku_of(map, row, INCOMING_SKU)?;
    let quantity = parse_quantity(map.cell(row, INCOMING_QTY)).ok_or("bad qty")?;
    IncomingShipment::new(sku, quantity, arrival_date).map_err(|e| e.to_string())
}
