//! Species catalog loader.

use std::path::Path;

use battle_core::SpeciesTemplate;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesCatalog {
    pub species: Vec<SpeciesTemplate>,
}

/// Loader for species templates from RON files.
///
/// Example:
/// ```ron
/// (species: [
///     (
///         id: "emberfox",
///         name: "Emberfox",
///         types: [Fire],
///         base_stats: (hp: 39, attack: 52, defense: 43, special: 60, speed: 65),
///         base_xp: 62,
///         learnset: [(level: 1, move_name: "tackle")],
///     ),
/// ])
/// ```
pub struct SpeciesLoader;

impl SpeciesLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<SpeciesTemplate>> {
        Self::parse(&read_file(path)?)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<SpeciesTemplate>> {
        let catalog: SpeciesCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse species catalog RON: {}", e))?;

        for species in &catalog.species {
            if species.types.is_empty() {
                anyhow::bail!("species {} has no type", species.id);
            }
            if species.base_stats.hp == 0 {
                anyhow::bail!("species {} has zero base HP", species.id);
            }
        }
        Ok(catalog.species)
    }
}
