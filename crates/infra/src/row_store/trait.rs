use std::sync::Arc;

use crate::error::StoreError;

/// One sheet row; cells are kept as text exactly as the sheet holds them.
pub type Row = Vec<String>;

/// Spreadsheet-like storage: append rows, read a whole sheet, rewrite cells.
///
/// Row numbers are 1-based and include the header row, so the first data row
/// of a sheet with headers is row 2. Columns are 0-based.
///
/// There are no transactions. `batch_update` honors each update's `expected`
/// guard: a cell whose current text differs is left untouched and not counted.
/// Adapters for remote stores must re-read before writing to emulate this.
pub trait RowStore: Send + Sync {
    /// Append a row and return its row number.
    fn append(&self, sheet: &str, row: Row) -> Result<usize, StoreError>;

    /// Every row of the sheet, header first. A sheet that was never written
    /// reads as empty.
    fn read_all(&self, sheet: &str) -> Result<Vec<Row>, StoreError>;

    /// Apply cell writes; returns how many were applied.
    fn batch_update(&self, sheet: &str, updates: &[CellUpdate]) -> Result<usize, StoreError>;
}

impl<S> RowStore for Arc<S>
where
    S: RowStore + ?Sized,
{
    fn append(&self, sheet: &str, row: Row) -> Result<usize, StoreError> {
        (**self).append(sheet, row)
    }

    fn read_all(&self, sheet: &str) -> Result<Vec<Row>, StoreError> {
        (**self).read_all(sheet)
    }

    fn batch_update(&self, sheet: &str, updates: &[CellUpdate]) -> Result<usize, StoreError> {
        (**self).batch_update(sheet, updates)
    }
}

/// A single conditional cell write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: usize,
    pub column: usize,
    pub value: String,
    /// Write only if the cell currently holds exactly this text.
    pub expected: Option<String>,
}

impl CellUpdate {
    pub fn set(row: usize, column: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            column,
            value: value.into(),
            expected: None,
        }
    }

    pub fn guarded(
        row: usize,
        column: usize,
        expected: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            row,
            column,
            value: value.into(),
            expected: Some(expected.into()),
        }
    }
}

/// Address of one cell, printable in A1 notation (`RESERVATIONS!D5`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef<'a> {
    pub sheet: &'a str,
    pub row: usize,
    pub column: usize,
}

impl CellRef<'_> {
    pub fn to_a1(&self) -> String {
        format!("{}!{}{}", self.sheet, column_letter(self.column), self.row)
    }
}

impl core::fmt::Display for CellRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// 0-based column index to spreadsheet letters: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letter(column: usize) -> String {
    let mut n = column + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(3), "D");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn a1_reference() {
        let cell = CellRef {
            sheet: "RESERVATIONS",
            row: 5,
            column: 3,
        };
        assert_eq!(cell.to_a1(), "RESERVATIONS!D5");
    }
}
