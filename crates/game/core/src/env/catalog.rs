//! In-memory oracle implementation backed by plain maps.

use std::collections::HashMap;

use super::{
    ElementType, ItemDefinition, ItemOracle, MoveDefinition, MoveOracle, SpeciesOracle,
    SpeciesTemplate, TypeChart, TypeChartOracle,
};

/// Complete static data set held in memory.
///
/// Content loaders produce one of these; tests build them by hand.
#[derive(Clone, Debug, Default)]
pub struct StaticGameData {
    species: HashMap<String, SpeciesTemplate>,
    moves: HashMap<String, MoveDefinition>,
    items: HashMap<String, ItemDefinition>,
    chart: HashMap<(ElementType, ElementType), f64>,
}

impl StaticGameData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_species(mut self, species: SpeciesTemplate) -> Self {
        self.species.insert(species.id.clone(), species);
        self
    }

    pub fn with_move(mut self, definition: MoveDefinition) -> Self {
        self.moves.insert(definition.name.clone(), definition);
        self
    }

    pub fn with_item(mut self, item: ItemDefinition) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    pub fn with_effectiveness(mut self, attack: ElementType, defend: ElementType, m: f64) -> Self {
        self.chart.insert((attack, defend), m);
        self
    }

    pub fn with_type_chart(mut self, chart: &TypeChart) -> Self {
        for entry in &chart.entries {
            self.chart
                .insert((entry.attack, entry.defend), entry.multiplier);
        }
        self
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn species_ids(&self) -> impl Iterator<Item = &str> {
        self.species.keys().map(String::as_str)
    }

    pub fn move_names(&self) -> impl Iterator<Item = &str> {
        self.moves.keys().map(String::as_str)
    }
}

impl SpeciesOracle for StaticGameData {
    fn species(&self, id: &str) -> Option<SpeciesTemplate> {
        self.species.get(id).cloned()
    }
}

impl MoveOracle for StaticGameData {
    fn move_definition(&self, name: &str) -> Option<MoveDefinition> {
        self.moves.get(name).cloned()
    }
}

impl ItemOracle for StaticGameData {
    fn item(&self, id: &str) -> Option<ItemDefinition> {
        self.items.get(id).cloned()
    }
}

impl TypeChartOracle for StaticGameData {
    fn effectiveness(&self, attack: ElementType, defend: ElementType) -> f64 {
        self.chart.get(&(attack, defend)).copied().unwrap_or(1.0)
    }
}
