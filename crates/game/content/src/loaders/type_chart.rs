//! Type-effectiveness chart loader.

use std::path::Path;

use battle_core::env::TypeChart;

use crate::loaders::{LoadResult, read_file};

pub struct TypeChartLoader;

impl TypeChartLoader {
    pub fn load(path: &Path) -> LoadResult<TypeChart> {
        Self::parse(&read_file(path)?)
    }

    pub fn parse(content: &str) -> LoadResult<TypeChart> {
        let chart: TypeChart = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse type chart RON: {}", e))?;

        if let Some(entry) = chart.entries.iter().find(|e| e.multiplier < 0.0) {
            anyhow::bail!(
                "negative multiplier for {} against {}",
                entry.attack,
                entry.defend
            );
        }
        Ok(chart)
    }
}
