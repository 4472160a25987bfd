//! Content factory for building oracles from data files.

use std::path::{Path, PathBuf};

use battle_core::env::TypeChart;
use battle_core::{
    BattleConfig, ItemDefinition, MoveDefinition, SpeciesTemplate, StaticGameData,
};

use crate::loaders::{
    ConfigLoader, ItemLoader, LoadResult, MoveLoader, SpeciesLoader, TypeChartLoader,
};

const EMBEDDED_SPECIES: &str = include_str!("../../data/species.ron");
const EMBEDDED_MOVES: &str = include_str!("../../data/moves.ron");
const EMBEDDED_ITEMS: &str = include_str!("../../data/items.ron");
const EMBEDDED_TYPE_CHART: &str = include_str!("../../data/type_chart.ron");

/// Builds the catalog compiled into this crate.
pub fn embedded_game_data() -> LoadResult<StaticGameData> {
    assemble(
        SpeciesLoader::parse(EMBEDDED_SPECIES)?,
        MoveLoader::parse(EMBEDDED_MOVES)?,
        ItemLoader::parse(EMBEDDED_ITEMS)?,
        TypeChartLoader::parse(EMBEDDED_TYPE_CHART)?,
    )
}

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml      (optional)
/// ├── species.ron
/// ├── moves.ron
/// ├── items.ron
/// └── type_chart.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Battle tuning from `config.toml`, or defaults when the file is absent.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(BattleConfig::default());
        }
        ConfigLoader::load(&path)
    }

    pub fn load_species(&self) -> LoadResult<Vec<SpeciesTemplate>> {
        SpeciesLoader::load(&self.data_dir.join("species.ron"))
    }

    pub fn load_moves(&self) -> LoadResult<Vec<MoveDefinition>> {
        MoveLoader::load(&self.data_dir.join("moves.ron"))
    }

    pub fn load_items(&self) -> LoadResult<Vec<ItemDefinition>> {
        ItemLoader::load(&self.data_dir.join("items.ron"))
    }

    pub fn load_type_chart(&self) -> LoadResult<TypeChart> {
        TypeChartLoader::load(&self.data_dir.join("type_chart.ron"))
    }

    /// Loads every catalog file and cross-checks references between them.
    pub fn load_game_data(&self) -> LoadResult<StaticGameData> {
        assemble(
            self.load_species()?,
            self.load_moves()?,
            self.load_items()?,
            self.load_type_chart()?,
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn assemble(
    species: Vec<SpeciesTemplate>,
    moves: Vec<MoveDefinition>,
    items: Vec<ItemDefinition>,
    chart: TypeChart,
) -> LoadResult<StaticGameData> {
    for template in &species {
        for entry in &template.learnset {
            if !moves.iter().any(|m| m.name == entry.move_name) {
                anyhow::bail!(
                    "species {} learns undefined move {}",
                    template.id,
                    entry.move_name
                );
            }
        }
    }

    let mut data = StaticGameData::new().with_type_chart(&chart);
    for template in species {
        data = data.with_species(template);
    }
    for definition in moves {
        data = data.with_move(definition);
    }
    for item in items {
        data = data.with_item(item);
    }
    Ok(data)
}
