//! Content loaders for reading game data from files.
//!
//! Each loader parses one file kind; [`ContentFactory`] ties them together
//! and cross-checks the result.

pub mod config;
pub mod factory;
pub mod item;
pub mod moves;
pub mod species;
pub mod type_chart;

pub use config::ConfigLoader;
pub use factory::{ContentFactory, embedded_game_data};
pub use item::ItemLoader;
pub use moves::MoveLoader;
pub use species::SpeciesLoader;
pub use type_chart::TypeChartLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
