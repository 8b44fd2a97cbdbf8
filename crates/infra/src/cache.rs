//! Time-bounded cache for the read-only feeds.
//!
//! Entries past their TTL are still returned, marked stale, so a caller can
//! fall back to them when the upstream feed is down.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use larder_core::Clock;
use larder_inventory::IncomingShipment;
use larder_routes::RouteSchedule;

use crate::feeds::CatalogEntry;

/// A cached value and whether it is still within its TTL.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<V> {
    pub value: V,
    pub fresh: bool,
}

pub trait Cache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<Cached<V>>;
    fn put(&self, key: &str, value: V, ttl: Duration);
}

impl<V, C> Cache<V> for Arc<C>
where
    C: Cache<V> + ?Sized,
{
    fn get(&self, key: &str) -> Option<Cached<V>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: V, ttl: Duration) {
        (**self).put(key, value, ttl)
    }
}

/// Process-local cache; expiry is judged against the injected clock.
pub struct InMemoryTtlCache<V> {
    entries: RwLock<HashMap<String, (V, DateTime<Utc>)>>,
    clock: Arc<dyn Clock>,
}

impl<V> InMemoryTtlCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

impl<V> Cache<V> for InMemoryTtlCache<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<Cached<V>> {
        let entries = self.entries.read().ok()?;
        let (value, expires_at) = entries.get(key)?;
        Some(Cached {
            value: value.clone(),
            fresh: self.clock.now() < *expires_at,
        })
    }

    fn put(&self, key: &str, value: V, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), (value, expires_at));
            }
            Err(_) => tracing::warn!(key, "cache lock poisoned; entry not stored"),
        }
    }
}

/// Serve a fresh cached value, else reload; a failed reload falls back to a
/// stale value when one exists.
pub fn read_through<V, E, C>(
    cache: &C,
    key: &str,
    ttl: Duration,
    load: impl FnOnce() -> Result<V, E>,
) -> Result<V, E>
where
    C: Cache<V> + ?Sized,
    V: Clone,
    E: std::fmt::Display,
{
    let cached = cache.get(key);
    if let Some(Cached { value, fresh: true }) = cached {
        return Ok(value);
    }

    match load() {
        Ok(value) => {
            cache.put(key, value.clone(), ttl);
            Ok(value)
        }
        Err(error) => match cached {
            Some(Cached { value, .. }) => {
                tracing::warn!(key, %error, "feed reload failed; serving stale cache entry");
                Ok(value)
            }
            None => Err(error),
        },
    }
}

/// The three feed caches used by the planner.
#[derive(Clone)]
pub struct PlannerCaches {
    pub routes: Arc<dyn Cache<Arc<Vec<RouteSchedule>>>>,
    pub catalog: Arc<dyn Cache<Arc<Vec<CatalogEntry>>>>,
    pub shipments: Arc<dyn Cache<Arc<Vec<IncomingShipment>>>>,
}

impl PlannerCaches {
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            routes: Arc::new(InMemoryTtlCache::new(clock.clone())),
            catalog: Arc::new(InMemoryTtlCache::new(clock.clone())),
            shipments: Arc::new(InMemoryTtlCache::new(clock)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use larder_core::ManualClock;

    fn setup() -> (Arc<ManualClock>, InMemoryTtlCache<u32>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap(),
        ));
        let cache = InMemoryTtlCache::new(clock.clone() as Arc<dyn Clock>);
        (clock, cache)
    }

    #[test]
    fn entries_go_stale_after_ttl() {
        let (clock, cache) = setup();
        cache.put("k", 7, Duration::minutes(5));
        assert_eq!(cache.get("k"), Some(Cached { value: 7, fresh: true }));

        clock.advance(Duration::minutes(5));
        assert_eq!(cache.get("k"), Some(Cached { value: 7, fresh: false }));
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn read_through_loads_once_while_fresh() {
        let (_, cache) = setup();
        let mut loads = 0;
        for _ in 0..3 {
            let v = read_through(&cache, "k", Duration::minutes(5), || {
                loads += 1;
                Ok::<_, String>(1)
            })
            .unwrap();
            assert_eq!(v, 1);
        }
        assert_eq!(loads, 1);
    }

    #[test]
    fn failed_reload_serves_stale_value() {
        let (clock, cache) = setup();
        read_through(&cache, "k", Duration::minutes(5), || Ok::<_, String>(3)).unwrap();
        clock.advance(Duration::minutes(10));

        let v = read_through(&cache, "k", Duration::minutes(5), || Err("down".to_string()));
        assert_eq!(v, Ok(3));

        let missing = read_through(&cache, "none", Duration::minutes(5), || Err::<u32, _>("down".to_string()));
        assert_eq!(missing, Err("down".to_string()));
    }
}
