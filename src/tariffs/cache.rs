//! Short-lived cache of resolved tariff versions

use super::TariffSource;
use crate::core::{CacheConfig, Category, Result, TariffVersion};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CachedTariff {
    version: TariffVersion,
    loaded_at: Instant,
}

/// Tariff lookups keyed by (category, as-of date).
///
/// Entries expire after the configured TTL and a category is dropped
/// whenever one of its tariffs is edited.
pub struct TariffCache {
    entries: Mutex<HashMap<(Category, NaiveDate), CachedTariff>>,
    ttl: Duration,
    max_entries: usize,
    enabled: bool,
}

impl TariffCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::from_secs(config.ttl_secs),
            max_entries: config.max_entries,
            enabled: config.enabled && config.max_entries > 0,
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<(Category, NaiveDate), CachedTariff>> {
        // The map holds plain data, so a panic elsewhere cannot leave it half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached version or load it from `source`
    pub fn get_or_load(&self, source: &dyn TariffSource, category: Category, as_of: NaiveDate) -> Result<TariffVersion> {
        if !self.enabled {
            return source.get_active_tariff(category, as_of);
        }

        let key = (category, as_of);
        if let Some(cached) = self.entries().get(&key) {
            if cached.loaded_at.elapsed() < self.ttl {
                log::debug!("Tariff cache hit for {} on {}", category, as_of);
                return Ok(cached.version.clone());
            }
        }

        log::debug!("Tariff cache miss for {} on {}", category, as_of);
        let version = source.get_active_tariff(category, as_of)?;

        let mut entries = self.entries();
        let ttl = self.ttl;
        entries.retain(|_, cached| cached.loaded_at.elapsed() < ttl);
        if entries.len() >= self.max_entries {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, cached)| cached.loaded_at)
                .map(|(key, _)| *key)
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CachedTariff {
                version: version.clone(),
                loaded_at: Instant::now(),
            },
        );

        Ok(version)
    }

    /// Drop every entry for `category`, called after its tariff changes
    pub fn invalidate(&self, category: Category) {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(cached_category, _), _| *cached_category != category);
        log::debug!("Invalidated {} cached {} tariff(s)", before - entries.len(), category);
    }

    /// Drop every cached tariff
    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use rust_decimal::Decimal;
    use std::cell::Cell;

    /// Counts lookups and serves a fixed version for residential only
    struct CountingSource {
        calls: Cell<u32>,
    }

    impl CountingSource {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl TariffSource for CountingSource {
        fn get_active_tariff(&self, category: Category, as_of: NaiveDate) -> Result<TariffVersion> {
            self.calls.set(self.calls.get() + 1);
            if category != Category::Residential {
                return Err(Error::NotFound("no tariff".to_string()));
            }
            Ok(TariffVersion {
                id: self.calls.get() as i64,
                category,
                fixed_charge: Decimal::ZERO,
                slabs: vec![],
                time_of_use: None,
                electricity_duty_percent: Decimal::ZERO,
                gst_percent: Decimal::ZERO,
                effective_date: as_of,
                valid_until: None,
            })
        }
    }

    fn config(ttl_secs: u64, max_entries: usize) -> CacheConfig {
        CacheConfig {
            enabled: true,
            ttl_secs,
            max_entries,
        }
    }

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, n).unwrap()
    }

    #[test]
    fn test_second_lookup_is_served_from_cache() {
        let cache = TariffCache::new(&config(60, 16));
        let source = CountingSource::new();

        let first = cache.get_or_load(&source, Category::Residential, day(1)).unwrap();
        let second = cache.get_or_load(&source, Category::Residential, day(1)).unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entries_are_reloaded() {
        let cache = TariffCache::new(&config(0, 16));
        let source = CountingSource::new();

        cache.get_or_load(&source, Category::Residential, day(1)).unwrap();
        cache.get_or_load(&source, Category::Residential, day(1)).unwrap();

        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn test_invalidate_drops_only_that_category() {
        let cache = TariffCache::new(&config(60, 16));
        let source = CountingSource::new();

        cache.get_or_load(&source, Category::Residential, day(1)).unwrap();
        cache.get_or_load(&source, Category::Residential, day(2)).unwrap();
        cache.invalidate(Category::Commercial);
        assert_eq!(cache.len(), 2);

        cache.invalidate(Category::Residential);
        assert!(cache.is_empty());

        cache.get_or_load(&source, Category::Residential, day(1)).unwrap();
        assert_eq!(source.calls.get(), 3);
    }

    #[test]
    fn test_clear_drops_every_entry() {
        let cache = TariffCache::new(&config(60, 16));
        let source = CountingSource::new();

        cache.get_or_load(&source, Category::Residential, day(1)).unwrap();
        cache.get_or_load(&source, Category::Residential, day(2)).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());

        cache.get_or_load(&source, Category::Residential, day(2)).unwrap();
        assert_eq!(source.calls.get(), 3);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = TariffCache::new(&config(60, 16));
        let source = CountingSource::new();

        assert!(cache.get_or_load(&source, Category::Industrial, day(1)).is_err());
        assert!(cache.get_or_load(&source, Category::Industrial, day(1)).is_err());
        assert_eq!(source.calls.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = TariffCache::new(&config(60, 2));
        let source = CountingSource::new();

        for n in 1..=3 {
            cache.get_or_load(&source, Category::Residential, day(n)).unwrap();
        }
        assert_eq!(cache.len(), 2);

        cache.get_or_load(&source, Category::Residential, day(3)).unwrap();
        assert_eq!(source.calls.get(), 3);
    }

    #[test]
    fn test_disabled_cache_always_loads() {
        let mut disabled = config(60, 16);
        disabled.enabled = false;
        let cache = TariffCache::new(&disabled);
        let source = CountingSource::new();

        cache.get_or_load(&source, Category::Residential, day(1)).unwrap();
        cache.get_or_load(&source, Category::Residential, day(1)).unwrap();

        assert_eq!(source.calls.get(), 2);
        assert!(cache.is_empty());
    }
}
