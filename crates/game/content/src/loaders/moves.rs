//! Move catalog loader.

use std::path::Path;

use battle_core::MoveDefinition;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveCatalog {
    pub moves: Vec<MoveDefinition>,
}

/// Loader for move definitions from RON files.
pub struct MoveLoader;

impl MoveLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<MoveDefinition>> {
        Self::parse(&read_file(path)?)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<MoveDefinition>> {
        let catalog: MoveCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse move catalog RON: {}", e))?;

        for definition in &catalog.moves {
            if definition.accuracy == 0 {
                anyhow::bail!("move {} has zero accuracy", definition.name);
            }
        }
        Ok(catalog.moves)
    }
}
