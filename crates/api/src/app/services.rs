//! Service wiring: row store, engine and the optional background sweeper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};

use larder_core::{Clock, SystemClock};
use larder_infra::row_store::{InMemoryRowStore, Row};
use larder_infra::{AvailabilityPlanner, Engine, EngineConfig, EngineResult, OrderController};

pub struct AppServices {
    engine: Engine,
    store: Arc<InMemoryRowStore>,
}

impl AppServices {
    pub fn new(
        store: Arc<InMemoryRowStore>,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> EngineResult<Self> {
        let engine = Engine::new(store.clone(), config, clock)?;
        Ok(Self { engine, store })
    }

    pub fn planner(&self) -> &AvailabilityPlanner {
        &self.engine.planner
    }

    pub fn controller(&self) -> &OrderController {
        &self.engine.controller
    }

    pub fn store(&self) -> &Arc<InMemoryRowStore> {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.engine.now()
    }
}

/// Production wiring: system clock, in-memory store seeded from
/// `LARDER_SEED_FILE` when set.
pub fn build_services(config: &EngineConfig) -> anyhow::Result<AppServices> {
    let store = Arc::new(InMemoryRowStore::new());

    if let Ok(path) = std::env::var("LARDER_SEED_FILE") {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read seed file {path}"))?;
        let rows = seed_from_json(&store, &text)?;
        tracing::info!(%path, rows, "seeded row store");
    }

    Ok(AppServices::new(store, config, Arc::new(SystemClock))?)
}

/// Load `{ "SHEET": [[cell, ...], ...], ... }` into the store; returns the
/// number of rows written. Numbers and booleans become their text form.
pub fn seed_from_json(store: &InMemoryRowStore, json: &str) -> anyhow::Result<usize> {
    let sheets: HashMap<String, Vec<Vec<serde_json::Value>>> =
        serde_json::from_str(json).context("seed file must map sheet names to rows")?;

    let mut written = 0;
    for (sheet, rows) in sheets {
        let rows: Vec<Row> = rows
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        written += rows.len();
        store.seed(&sheet, rows)?;
    }
    Ok(written)
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Sweep lapsed holds every `every` until the runtime shuts down.
pub fn spawn_sweeper(services: Arc<AppServices>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match services.controller().sweep(services.now()) {
                Ok(0) => {}
                Ok(expired) => tracing::info!(expired, "periodic sweep"),
                Err(error) => tracing::warn!(%error, "periodic sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_infra::row_store::RowStore;

    #[test]
    fn seed_converts_cells_to_text() {
        let store = InMemoryRowStore::new();
        let written = seed_from_json(
            &store,
            r#"{"CATALOG": [["sku", "description", "stock"], [100, "Costela", 10.5], [200, null, true]]}"#,
        )
        .unwrap();
        assert_eq!(written, 3);

        let rows = store.read_all("CATALOG").unwrap();
        assert_eq!(rows[1], vec!["100", "Costela", "10.5"]);
        assert_eq!(rows[2], vec!["200", "", "true"]);
    }

    #[test]
    fn seed_rejects_wrong_shape() {
        let store = InMemoryRowStore::new();
        assert!(seed_from_json(&store, r#"{"CATALOG": "nope"}"#).is_err());
    }
}
