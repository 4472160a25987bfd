use std::sync::Arc;
use std::time::Duration;

use battle_cache::{CacheError, CacheManager, CacheStats, ReadThroughCache};
use battle_core::{
    ElementType, GameDataOracle, ItemDefinition, ItemOracle, MoveDefinition, MoveOracle,
    SpeciesOracle, SpeciesTemplate, TypeChartOracle,
};
use tracing::debug;

/// Table names used as cache dependencies.
pub mod tables {
    pub const SPECIES: &str = "species";
    pub const MOVES: &str = "moves";
    pub const ITEMS: &str = "items";
    pub const TYPE_CHART: &str = "type_chart";
}

/// Read-through caching layer over a game data source.
///
/// Misses are not cached, so a lookup for an unknown id always reaches the
/// source.
pub struct CachedGameData {
    source: Arc<dyn GameDataOracle>,
    species: Arc<ReadThroughCache<SpeciesTemplate>>,
    moves: Arc<ReadThroughCache<MoveDefinition>>,
    items: Arc<ReadThroughCache<ItemDefinition>>,
    type_chart: Arc<ReadThroughCache<f64>>,
}

impl CachedGameData {
    /// Creates one cache per table and registers them with `caches` so they
    /// take part in the expiry sweep and aggregated stats.
    pub fn new(
        source: Arc<dyn GameDataOracle>,
        caches: &CacheManager,
        capacity: usize,
        ttl: Option<Duration>,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            source,
            species: caches.read_through("game_data.species", capacity, ttl)?,
            moves: caches.read_through("game_data.moves", capacity, ttl)?,
            items: caches.read_through("game_data.items", capacity, ttl)?,
            type_chart: caches.read_through("game_data.type_chart", capacity, ttl)?,
        })
    }

    /// Drops every cached entry derived from `table`.
    pub fn invalidate_table(&self, table: &str) -> usize {
        let removed = self.species.invalidate_table(table)
            + self.moves.invalidate_table(table)
            + self.items.invalidate_table(table)
            + self.type_chart.invalidate_table(table);
        debug!(target: "cache", table, removed, "Invalidated game data table");
        removed
    }

    pub fn stats(&self) -> Vec<(&str, CacheStats)> {
        vec![
            (self.species.name(), self.species.stats()),
            (self.moves.name(), self.moves.stats()),
            (self.items.name(), self.items.stats()),
            (self.type_chart.name(), self.type_chart.stats()),
        ]
    }
}

impl SpeciesOracle for CachedGameData {
    fn species(&self, id: &str) -> Option<SpeciesTemplate> {
        self.species
            .get_or_load_optional(id, &[tables::SPECIES], || self.source.species(id))
    }
}

impl MoveOracle for CachedGameData {
    fn move_definition(&self, name: &str) -> Option<MoveDefinition> {
        self.moves
            .get_or_load_optional(name, &[tables::MOVES], || self.source.move_definition(name))
    }
}

impl ItemOracle for CachedGameData {
    fn item(&self, id: &str) -> Option<ItemDefinition> {
        self.items
            .get_or_load_optional(id, &[tables::ITEMS], || self.source.item(id))
    }
}

impl TypeChartOracle for CachedGameData {
    fn effectiveness(&self, attack: ElementType, defend: ElementType) -> f64 {
        let key = format!("{attack}:{defend}");
        if let Some(multiplier) = self.type_chart.get(&key) {
            return multiplier;
        }
        let multiplier = self.source.effectiveness(attack, defend);
        self.type_chart.put(key, multiplier, &[tables::TYPE_CHART]);
        multiplier
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Source that counts how often it is consulted.
    struct CountingSource {
        inner: Arc<dyn GameDataOracle>,
        species_lookups: AtomicUsize,
        chart_lookups: AtomicUsize,
    }

    impl SpeciesOracle for CountingSource {
        fn species(&self, id: &str) -> Option<SpeciesTemplate> {
            self.species_lookups.fetch_add(1, Ordering::Relaxed);
            self.inner.species(id)
        }
    }

    impl MoveOracle for CountingSource {
        fn move_definition(&self, name: &str) -> Option<MoveDefinition> {
            self.inner.move_definition(name)
        }
    }

    impl ItemOracle for CountingSource {
        fn item(&self, id: &str) -> Option<ItemDefinition> {
            self.inner.item(id)
        }
    }

    impl TypeChartOracle for CountingSource {
        fn effectiveness(&self, attack: ElementType, defend: ElementType) -> f64 {
            self.chart_lookups.fetch_add(1, Ordering::Relaxed);
            self.inner.effectiveness(attack, defend)
        }
    }

    fn counting() -> Arc<CountingSource> {
        let data = battle_content::embedded_game_data().expect("embedded content loads");
        Arc::new(CountingSource {
            inner: Arc::new(data),
            species_lookups: AtomicUsize::new(0),
            chart_lookups: AtomicUsize::new(0),
        })
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let source = counting();
        let caches = CacheManager::new();
        let cached = CachedGameData::new(source.clone(), &caches, 16, None).unwrap();

        let first = cached.species("emberfox").expect("emberfox exists");
        let second = cached.species("emberfox").unwrap();
        assert_eq!(first, second);
        assert_eq!(source.species_lookups.load(Ordering::Relaxed), 1);

        let a = cached.effectiveness(ElementType::Fire, ElementType::Nature);
        let b = cached.effectiveness(ElementType::Fire, ElementType::Nature);
        assert_eq!(a, b);
        assert_eq!(source.chart_lookups.load(Ordering::Relaxed), 1);
        assert_eq!(caches.len(), 4);
    }

    #[test]
    fn unknown_ids_are_not_cached() {
        let source = counting();
        let caches = CacheManager::new();
        let cached = CachedGameData::new(source.clone(), &caches, 16, None).unwrap();

        assert!(cached.species("missingno").is_none());
        assert!(cached.species("missingno").is_none());
        assert_eq!(source.species_lookups.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn invalidating_a_table_only_drops_its_entries() {
        let source = counting();
        let caches = CacheManager::new();
        let cached = CachedGameData::new(source.clone(), &caches, 16, None).unwrap();

        cached.species("emberfox");
        cached.effectiveness(ElementType::Water, ElementType::Fire);

        assert_eq!(cached.invalidate_table(tables::SPECIES), 1);
        cached.species("emberfox");
        cached.effectiveness(ElementType::Water, ElementType::Fire);
        assert_eq!(source.species_lookups.load(Ordering::Relaxed), 2);
        assert_eq!(source.chart_lookups.load(Ordering::Relaxed), 1);
    }
}
