//! Data-driven content definitions and loaders.
//!
//! This crate houses the static battle catalog and the loaders that read it:
//! - Species templates with learnsets and forms (RON)
//! - Move definitions (RON)
//! - Item catalog (RON)
//! - Type-effectiveness chart (RON)
//! - Battle rule tuning (TOML)
//!
//! A default catalog is compiled into the crate; a data directory with the
//! same file layout can override it. Content is consumed by runtime oracles
//! and never appears in battle state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, ContentFactory, ItemLoader, LoadResult, MoveLoader, SpeciesLoader,
    TypeChartLoader, embedded_game_data,
};
