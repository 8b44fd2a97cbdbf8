//! Read-only feeds: product catalog, incoming shipments and route schedules.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use larder_core::Sku;
use larder_inventory::IncomingShipment;
use larder_routes::RouteSchedule;

use crate::error::FeedError;
use crate::row_store::RowStore;
use crate::sheets::{self, catalog, decode_rows};

/// One sellable SKU with its on-hand stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub sku: Sku,
    pub description: String,
    /// Raw stock figure; rounded half-up before use.
    pub base_stock: f64,
}

pub trait CatalogFeed: Send + Sync {
    fn catalog(&self) -> Result<Vec<CatalogEntry>, FeedError>;
    fn incoming_shipments(&self) -> Result<Vec<IncomingShipment>, FeedError>;
}

impl<F> CatalogFeed for Arc<F>
where
    F: CatalogFeed + ?Sized,
{
    fn catalog(&self) -> Result<Vec<CatalogEntry>, FeedError> {
        (**self).catalog()
    }

    fn incoming_shipments(&self) -> Result<Vec<IncomingShipment>, FeedError> {
        (**self).incoming_shipments()
    }
}

pub trait RouteFeed: Send + Sync {
    fn schedules(&self) -> Result<Vec<RouteSchedule>, FeedError>;
}

impl<F> RouteFeed for Arc<F>
where
    F: RouteFeed + ?Sized,
{
    fn schedules(&self) -> Result<Vec<RouteSchedule>, FeedError> {
        (**self).schedules()
    }
}

/// Catalog and shipments read from two sheets of a row store.
#[derive(Debug)]
pub struct SheetCatalogFeed<S> {
    store: S,
    catalog_sheet: String,
    incoming_sheet: String,
}

impl<S> SheetCatalogFeed<S> {
    pub fn new(store: S, catalog_sheet: impl Into<String>, incoming_sheet: impl Into<String>) -> Self {
        Self {
            store,
            catalog_sheet: catalog_sheet.into(),
            incoming_sheet: incoming_sheet.into(),
        }
    }
}

impl<S: RowStore> CatalogFeed for SheetCatalogFeed<S> {
    fn catalog(&self) -> Result<Vec<CatalogEntry>, FeedError> {
        let rows = self.store.read_all(&self.catalog_sheet)?;
        let (_, entries) = decode_rows(
            &self.catalog_sheet,
            &catalog::CATALOG_LAYOUT,
            &rows,
            catalog::decode_catalog,
        )?;
        Ok(entries.into_iter().map(|n| n.value).collect())
    }

    fn incoming_shipments(&self) -> Result<Vec<IncomingShipment>, FeedError> {
        let rows = self.store.read_all(&self.incoming_sheet)?;
        let (_, shipments) = decode_rows(
            &self.incoming_sheet,
            &catalog::INCOMING_LAYOUT,
            &rows,
            catalog::decode_incoming,
        )?;
        Ok(shipments.into_iter().map(|n| n.value).collect())
    }
}

/// Route schedules read from a row store sheet.
#[derive(Debug)]
pub struct SheetRouteFeed<S> {
    store: S,
    sheet: String,
}

impl<S> SheetRouteFeed<S> {
    pub fn new(store: S, sheet: impl Into<String>) -> Self {
        Self {
            store,
            sheet: sheet.into(),
        }
    }
}

impl<S: RowStore> RouteFeed for SheetRouteFeed<S> {
    fn schedules(&self) -> Result<Vec<RouteSchedule>, FeedError> {
        let rows = self.store.read_all(&self.sheet)?;
        let (_, routes) = decode_rows(&self.sheet, &sheets::routes::LAYOUT, &rows, sheets::routes::decode)?;
        Ok(routes.into_iter().map(|n| n.value).collect())
    }
}
