//! Cached access to static game data.
//!
//! Engines read species, moves, items and the type chart through
//! [`battle_core::GameDataOracle`]. [`CachedGameData`] puts a read-through
//! cache in front of any source implementation so hot lookups skip the
//! source entirely, and a content reload can drop exactly the affected table.
mod cached;

pub use cached::{CachedGameData, tables};
