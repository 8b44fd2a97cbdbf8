//! Sheet layouts and row codecs.
//!
//! Every sheet starts with a header row. Columns are located by header name
//! (with a few legacy aliases) so a reordered sheet still decodes; rows that
//! cannot be decoded are skipped and counted.

pub mod catalog;
pub mod cells;
pub mod orders;
pub mod reservations;
pub mod routes;

use larder_routes::text::normalize;

use crate::error::StoreError;
use crate::row_store::{Row, RowStore};

/// A logical column and the header texts that identify it.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Column {
    pub const fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }

    fn matches(&self, header_key: &str) -> bool {
        header_key == key(self.name) || self.aliases.iter().any(|a| header_key == key(a))
    }
}

/// Ordered logical columns of a sheet; the order is used for new headers.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    pub columns: &'static [Column],
}

impl SheetLayout {
    pub fn header_row(&self) -> Row {
        self.columns.iter().map(|c| c.name.to_string()).collect()
    }
}

fn key(header: &str) -> String {
    normalize(header).chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Physical position of each logical column in one concrete sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    positions: Vec<usize>,
}

impl HeaderMap {
    /// Positions for a sheet whose header was written from `layout`.
    pub fn canonical(layout: &SheetLayout) -> Self {
        Self {
            positions: (0..layout.columns.len()).collect(),
        }
    }

    /// Locate every logical column in `header`.
    pub fn resolve(sheet: &str, layout: &SheetLayout, header: &[String]) -> Result<Self, StoreError> {
        let keys: Vec<String> = header.iter().map(|h| key(h)).collect();
        let mut positions = Vec::with_capacity(layout.columns.len());
        let mut missing = Vec::new();
        for column in layout.columns {
            match keys.iter().position(|k| column.matches(k)) {
                Some(p) => positions.push(p),
                None => missing.push(column.name),
            }
        }
        if !missing.is_empty() {
            return Err(StoreError::Malformed(format!(
                "sheet {sheet} is missing columns: {}",
                missing.join(", ")
            )));
        }
        Ok(Self { positions })
    }

    /// Sheet column of logical column `column`.
    pub fn position(&self, column: usize) -> usize {
        self.positions[column]
    }

    /// Text of logical column `column` in `row` (empty when the row is short).
    pub fn cell<'r>(&self, row: &'r [String], column: usize) -> &'r str {
        row.get(self.position(column)).map(String::as_str).unwrap_or("")
    }

    /// Lay out values given in logical order into a physical row.
    pub fn build_row(&self, values: Vec<String>) -> Row {
        let width = self.positions.iter().max().map_or(0, |m| m + 1);
        let mut row = vec![String::new(); width];
        for (column, value) in values.into_iter().enumerate() {
            if let Some(&p) = self.positions.get(column) {
                row[p] = value;
            }
        }
        row
    }
}

/// Header map for `sheet`, writing the header row first if the sheet is empty.
pub fn ensure_headers<S>(store: &S, sheet: &str, layout: &SheetLayout) -> Result<HeaderMap, StoreError>
where
    S: RowStore + ?Sized,
{
    let rows = store.read_all(sheet)?;
    match rows.first() {
        Some(header) => HeaderMap::resolve(sheet, layout, header),
        None => {
            store.append(sheet, layout.header_row())?;
            tracing::info!(sheet, "wrote missing header row");
            Ok(HeaderMap::canonical(layout))
        }
    }
}

/// A decoded data row with its 1-based sheet row number.
#[derive(Debug, Clone, PartialEq)]
pub struct Numbered<T> {
    pub row: usize,
    pub value: T,
}

/// Decode every data row; undecodable rows are skipped and reported once.
pub fn decode_rows<T>(
    sheet: &str,
    layout: &SheetLayout,
    rows: &[Row],
    decode: impl Fn(&HeaderMap, &[String]) -> Result<T, String>,
) -> Result<(HeaderMap, Vec<Numbered<T>>), StoreError> {
    let Some((header, data)) = rows.split_first() else {
        return Ok((HeaderMap::canonical(layout), Vec::new()));
    };
    let map = HeaderMap::resolve(sheet, layout, header)?;

    let mut decoded = Vec::with_capacity(data.len());
    let mut skipped = 0usize;
    let mut first_reason = None;
    for (i, row) in data.iter().enumerate() {
        if row.iter().all(|c| cells::clean(c).is_none()) {
            continue;
        }
        match decode(&map, row) {
            Ok(value) => decoded.push(Numbered { row: i + 2, value }),
            Err(reason) => {
                skipped += 1;
                first_reason.get_or_insert_with(|| format!("row {}: {reason}", i + 2));
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(
            sheet,
            skipped,
            first = first_reason.as_deref().unwrap_or(""),
            "skipped undecodable rows"
        );
    }
    Ok((map, decoded))
}
