//! Traits describing read-only game data.
//!
//! Oracles expose species templates, move and item definitions and the type
//! effectiveness matrix. The engine only ever sees them through
//! [`GameDataOracle`], so the runtime is free to back them with caches.
mod catalog;
mod data;
mod rng;

pub use catalog::StaticGameData;
pub use data::{
    BaseStats, EffectTarget, ElementType, FormTemplate, ItemDefinition, ItemEffect, LearnsetEntry,
    MoveCategory, MoveDefinition, SpeciesTemplate, StageChange, StatMultipliers, StatusInfliction,
    TypeChart, TypeChartEntry,
};
pub use rng::{PcgRng, RngOracle, RollKind, compute_seed};

/// Species templates keyed by species id.
pub trait SpeciesOracle: Send + Sync {
    fn species(&self, id: &str) -> Option<SpeciesTemplate>;

    /// Form of a species, `None` when either is unknown.
    fn form(&self, species_id: &str, form_id: &str) -> Option<FormTemplate> {
        self.species(species_id)
            .and_then(|species| species.form(form_id).cloned())
    }
}

/// Move definitions keyed by move name.
pub trait MoveOracle: Send + Sync {
    fn move_definition(&self, name: &str) -> Option<MoveDefinition>;
}

/// Item definitions keyed by item id.
pub trait ItemOracle: Send + Sync {
    fn item(&self, id: &str) -> Option<ItemDefinition>;
}

/// Type-effectiveness matrix.
pub trait TypeChartOracle: Send + Sync {
    fn effectiveness(&self, attack: ElementType, defend: ElementType) -> f64;

    /// Combined multiplier against a multi-typed defender.
    fn effectiveness_against(&self, attack: ElementType, defenders: &[ElementType]) -> f64 {
        defenders
            .iter()
            .map(|defend| self.effectiveness(attack, *defend))
            .product()
    }
}

/// Everything the engine reads from static data.
pub trait GameDataOracle: SpeciesOracle + MoveOracle + ItemOracle + TypeChartOracle {}

impl<T> GameDataOracle for T where T: SpeciesOracle + MoveOracle + ItemOracle + TypeChartOracle {}
