//! Row store port: the spreadsheet as an abstract table of text rows.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryRowStore;
pub use r#trait::{CellRef, CellUpdate, Row, RowStore, column_letter};
