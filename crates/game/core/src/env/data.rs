//! Static game data definitions: species, forms, moves, items and elements.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::state::{FieldConditionKind, StatKind, StatusKind, Weather};

/// Elemental type tag carried by species and moves.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ElementType {
    Normal,
    Fire,
    Water,
    Nature,
    Electric,
    Earth,
    Air,
    Ice,
    Light,
    Shadow,
    Metal,
    Mind,
}

/// Base stats of a species before level scaling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub special: u32,
    pub speed: u32,
}

/// Multipliers a form applies on top of the species stats.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatMultipliers {
    #[serde(default = "one")]
    pub attack: f64,
    #[serde(default = "one")]
    pub defense: f64,
    #[serde(default = "one")]
    pub special: f64,
    #[serde(default = "one")]
    pub speed: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for StatMultipliers {
    fn default() -> Self {
        Self {
            attack: 1.0,
            defense: 1.0,
            special: 1.0,
            speed: 1.0,
        }
    }
}

impl StatMultipliers {
    pub fn get(&self, stat: StatKind) -> f64 {
        match stat {
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::Special => self.special,
            StatKind::Speed => self.speed,
        }
    }
}

/// Alternate form of a species (mega, elemental shift, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub multipliers: StatMultipliers,
}

/// Species template shared by every combatant of that species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTemplate {
    pub id: String,
    pub name: String,
    pub types: Vec<ElementType>,
    pub base_stats: BaseStats,
    /// Experience granted for defeating one of these at level 1.
    pub base_xp: u32,
    /// Moves in learn order; the last four known at a level are equipped.
    #[serde(default)]
    pub learnset: Vec<LearnsetEntry>,
    #[serde(default)]
    pub forms: Vec<FormTemplate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnsetEntry {
    pub level: u32,
    pub move_name: String,
}

impl SpeciesTemplate {
    pub fn form(&self, id: &str) -> Option<&FormTemplate> {
        self.forms.iter().find(|form| form.id == id)
    }

    /// Moves known at `level`, most recently learned last.
    pub fn moves_at(&self, level: u32) -> Vec<String> {
        let learned: Vec<&LearnsetEntry> = self
            .learnset
            .iter()
            .filter(|entry| entry.level <= level)
            .collect();
        let skip = learned.len().saturating_sub(crate::BattleConfig::MAX_MOVES);
        learned
            .into_iter()
            .skip(skip)
            .map(|entry| entry.move_name.clone())
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum MoveCategory {
    /// Uses attack against defense.
    Physical,
    /// Uses special against special.
    Special,
    /// Deals no damage.
    Status,
}

/// Who a secondary effect lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectTarget {
    User,
    Target,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfliction {
    pub kind: StatusKind,
    /// Percent chance per successful hit.
    pub chance: u8,
    pub turns: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChange {
    pub stat: StatKind,
    pub stages: i8,
    pub target: EffectTarget,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveDefinition {
    pub name: String,
    pub element: ElementType,
    pub category: MoveCategory,
    pub power: u32,
    /// Hit chance in percent; 100 or more never misses.
    pub accuracy: u8,
    #[serde(default)]
    pub inflicts: Option<StatusInfliction>,
    #[serde(default)]
    pub stage_change: Option<StageChange>,
    #[serde(default)]
    pub sets_weather: Option<Weather>,
    #[serde(default)]
    pub field_condition: Option<FieldConditionKind>,
}

impl MoveDefinition {
    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status && self.power > 0
    }
}

/// Effect applied when an item is used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ItemEffect {
    /// Restores a flat amount of HP to the active combatant.
    Heal(u32),
    /// Restores a percentage of max HP to the active combatant.
    HealPercent(u8),
    /// Removes one status kind, or every harmful status when `None`.
    Cure(Option<StatusKind>),
    /// Revives the first fainted combatant at a percentage of max HP.
    Revive(u8),
    /// Raises or lowers a stat stage of the active combatant.
    StatBoost { stat: StatKind, stages: i8 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    pub effect: ItemEffect,
}

/// Sparse type-effectiveness chart; missing pairs are neutral (1.0).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeChart {
    pub entries: Vec<TypeChartEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeChartEntry {
    pub attack: ElementType,
    pub defend: ElementType,
    pub multiplier: f64,
}

impl TypeChart {
    pub fn multiplier(&self, attack: ElementType, defend: ElementType) -> f64 {
        self.entries
            .iter()
            .find(|entry| entry.attack == attack && entry.defend == defend)
            .map_or(1.0, |entry| entry.multiplier)
    }
}
