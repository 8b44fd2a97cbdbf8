use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::StoreError;

use super::r#trait::{CellRef, CellUpdate, Row, RowStore};

#[derive(Debug, Default)]
struct Faults {
    unavailable: HashSet<String>,
    /// Appends still allowed before the sheet starts failing.
    append_budget: HashMap<String, usize>,
}

/// In-memory row store.
///
/// Intended for tests/dev. Supports failure injection per sheet so callers
/// can exercise partial writes and upstream outages.
#[derive(Debug, Default)]
pub struct InMemoryRowStore {
    sheets: RwLock<HashMap<String, Vec<Row>>>,
    faults: RwLock<Faults>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a sheet with rows (header first), replacing existing content.
    pub fn seed(&self, sheet: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        let mut sheets = self
            .sheets
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        sheets.insert(sheet.to_string(), rows);
        Ok(())
    }

    /// Make every operation on `sheet` fail with `Unavailable`.
    pub fn set_unavailable(&self, sheet: &str, unavailable: bool) {
        if let Ok(mut faults) = self.faults.write() {
            if unavailable {
                faults.unavailable.insert(sheet.to_string());
            } else {
                faults.unavailable.remove(sheet);
            }
        }
    }

    /// Let `successes` more appends to `sheet` through, then fail the rest.
    pub fn fail_appends_after(&self, sheet: &str, successes: usize) {
        if let Ok(mut faults) = self.faults.write() {
            faults.append_budget.insert(sheet.to_string(), successes);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.write() {
            *faults = Faults::default();
        }
    }

    fn check_available(&self, sheet: &str) -> Result<(), StoreError> {
        let faults = self
            .faults
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        if faults.unavailable.contains(sheet) {
            return Err(StoreError::Unavailable(format!("sheet {sheet} is unreachable")));
        }
        Ok(())
    }

    fn take_append_budget(&self, sheet: &str) -> Result<(), StoreError> {
        let mut faults = self
            .faults
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        if let Some(remaining) = faults.append_budget.get_mut(sheet) {
            if *remaining == 0 {
                return Err(StoreError::Unavailable(format!("append to {sheet} failed")));
            }
            *remaining -= 1;
        }
        Ok(())
    }
}

impl RowStore for InMemoryRowStore {
    fn append(&self, sheet: &str, row: Row) -> Result<usize, StoreError> {
        self.check_available(sheet)?;
        self.take_append_budget(sheet)?;

        let mut sheets = self
            .sheets
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        let rows = sheets.entry(sheet.to_string()).or_default();
        rows.push(row);
        Ok(rows.len())
    }

    fn read_all(&self, sheet: &str) -> Result<Vec<Row>, StoreError> {
        self.check_available(sheet)?;

        let sheets = self
            .sheets
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(sheets.get(sheet).cloned().unwrap_or_default())
    }

    fn batch_update(&self, sheet: &str, updates: &[CellUpdate]) -> Result<usize, StoreError> {
        self.check_available(sheet)?;
        if updates.is_empty() {
            return Ok(0);
        }

        let mut sheets = self
            .sheets
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        let rows = sheets
            .get_mut(sheet)
            .ok_or_else(|| StoreError::UnknownSheet(sheet.to_string()))?;

        // Validate every address before writing anything.
        for u in updates {
            if u.row == 0 || u.row > rows.len() {
                let cell = CellRef {
                    sheet,
                    row: u.row,
                    column: u.column,
                };
                return Err(StoreError::Malformed(format!("{cell} is out of range")));
            }
        }

        let mut applied = 0;
        for u in updates {
            let row = &mut rows[u.row - 1];
            if row.len() <= u.column {
                row.resize(u.column + 1, String::new());
            }
            let cell = &mut row[u.column];
            if u.expected.as_ref().is_some_and(|expected| cell != expected) {
                continue;
            }
            *cell = u.value.clone();
            applied += 1;
        }
        Ok(applied)
    }
}
