//! Combatants: creature instances occupying roster slots.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::{StatusEffect, StatusKind};
use crate::config::BattleConfig;
use crate::env::{ElementType, SpeciesTemplate};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatKind {
    Attack,
    Defense,
    Special,
    Speed,
}

/// Level-scaled stats of a combatant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub attack: u32,
    pub defense: u32,
    pub special: u32,
    pub speed: u32,
}

impl StatBlock {
    pub fn get(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::Special => self.special,
            StatKind::Speed => self.speed,
        }
    }
}

/// In-battle stat stage modifiers, each clamped to `[-6, 6]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatStages {
    pub attack: i8,
    pub defense: i8,
    pub special: i8,
    pub speed: i8,
}

impl StatStages {
    pub fn get(&self, stat: StatKind) -> i8 {
        match stat {
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::Special => self.special,
            StatKind::Speed => self.speed,
        }
    }

    fn slot(&mut self, stat: StatKind) -> &mut i8 {
        match stat {
            StatKind::Attack => &mut self.attack,
            StatKind::Defense => &mut self.defense,
            StatKind::Special => &mut self.special,
            StatKind::Speed => &mut self.speed,
        }
    }

    /// Applies a stage delta and returns the change actually applied.
    pub fn apply(&mut self, stat: StatKind, delta: i8) -> i8 {
        let slot = self.slot(stat);
        let before = *slot;
        *slot = before
            .saturating_add(delta)
            .clamp(-BattleConfig::MAX_STAGE, BattleConfig::MAX_STAGE);
        *slot - before
    }

    pub fn multiplier(&self, stat: StatKind) -> f64 {
        stage_multiplier(self.get(stat))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// `(2 + s) / 2` for raised stages, `2 / (2 - s)` for lowered ones.
pub fn stage_multiplier(stage: i8) -> f64 {
    let stage = f64::from(stage.clamp(-BattleConfig::MAX_STAGE, BattleConfig::MAX_STAGE));
    if stage >= 0.0 {
        (2.0 + stage) / 2.0
    } else {
        2.0 / (2.0 - stage)
    }
}

/// A creature instance taking part in a battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Species template id.
    pub species: String,
    pub nickname: Option<String>,
    pub level: u32,
    pub current_hp: u32,
    pub max_hp: u32,
    pub stats: StatBlock,
    pub types: Vec<ElementType>,
    pub stages: StatStages,
    pub moves: ArrayVec<String, { BattleConfig::MAX_MOVES }>,
    pub status_effects: Vec<StatusEffect>,
    /// Active form id, if the species has switched form.
    pub form: Option<String>,
}

impl Combatant {
    /// Creates a combatant at full HP with the given stats.
    ///
    /// Moves beyond [`BattleConfig::MAX_MOVES`] are ignored.
    pub fn new(
        species: impl Into<String>,
        level: u32,
        max_hp: u32,
        stats: StatBlock,
        types: Vec<ElementType>,
        moves: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            species: species.into(),
            nickname: None,
            level,
            current_hp: max_hp,
            max_hp,
            stats,
            types,
            stages: StatStages::default(),
            moves: moves.into_iter().take(BattleConfig::MAX_MOVES).collect(),
            status_effects: Vec::new(),
            form: None,
        }
    }

    /// Builds a combatant from a species template at `level`.
    pub fn from_template(template: &SpeciesTemplate, level: u32) -> Self {
        let level = level.clamp(1, 100);
        let base = template.base_stats;
        let scale = |base: u32| base * 2 * level / 100 + 5;
        let stats = StatBlock {
            attack: scale(base.attack),
            defense: scale(base.defense),
            special: scale(base.special),
            speed: scale(base.speed),
        };
        let max_hp = base.hp * 2 * level / 100 + level + 10;
        Self::new(
            template.id.clone(),
            level,
            max_hp,
            stats,
            template.types.clone(),
            template.moves_at(level),
        )
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    pub fn with_hp(mut self, current_hp: u32) -> Self {
        self.current_hp = current_hp.min(self.max_hp);
        self
    }

    /// Rejects combatants that could not take part in a battle.
    pub fn validate(&self) -> Result<(), String> {
        if self.species.is_empty() {
            return Err("species id is empty".into());
        }
        if self.level == 0 {
            return Err("level must be at least 1".into());
        }
        if self.max_hp == 0 {
            return Err("max HP must be positive".into());
        }
        if self.current_hp > self.max_hp {
            return Err(format!(
                "current HP {} exceeds max HP {}",
                self.current_hp, self.max_hp
            ));
        }
        Ok(())
    }

    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.species)
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn knows_move(&self, name: &str) -> bool {
        self.moves.iter().any(|known| known.eq_ignore_ascii_case(name))
    }

    /// Canonical spelling of a known move.
    pub fn known_move(&self, name: &str) -> Option<&str> {
        self.moves
            .iter()
            .find(|known| known.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Subtracts HP, never below zero. Returns the HP actually lost.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.current_hp);
        self.current_hp -= lost;
        lost
    }

    /// Adds HP, never above max. Returns the HP actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.max_hp - self.current_hp);
        self.current_hp += restored;
        restored
    }

    /// Brings a fainted combatant back at `percent` of max HP (at least 1).
    pub fn revive(&mut self, percent: u8) -> u32 {
        if self.is_alive() {
            return 0;
        }
        self.status_effects.clear();
        self.stages.reset();
        let hp = (self.max_hp * u32::from(percent.min(100)) / 100).max(1);
        self.heal(hp)
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.status_effects.iter().any(|effect| effect.kind == kind)
    }

    /// Adds an effect unless one of the same kind is already active.
    pub fn add_status(&mut self, effect: StatusEffect) -> bool {
        if self.has_status(effect.kind)
            || self.status_effects.len() >= BattleConfig::MAX_STATUS_EFFECTS
        {
            return false;
        }
        self.status_effects.push(effect);
        true
    }

    pub fn remove_status(&mut self, kind: StatusKind) -> bool {
        let before = self.status_effects.len();
        self.status_effects.retain(|effect| effect.kind != kind);
        before != self.status_effects.len()
    }

    /// Removes every harmful effect and returns their kinds.
    pub fn clear_harmful_statuses(&mut self) -> Vec<StatusKind> {
        let cured: Vec<StatusKind> = self
            .status_effects
            .iter()
            .filter(|effect| effect.kind.is_harmful())
            .map(|effect| effect.kind)
            .collect();
        self.status_effects.retain(|effect| !effect.kind.is_harmful());
        cured
    }

    pub fn status_speed_modifier(&self) -> f64 {
        self.status_effects
            .iter()
            .filter_map(|effect| effect.speed_modifier)
            .product()
    }

    pub fn status_flee_modifier(&self) -> f64 {
        self.status_effects
            .iter()
            .filter_map(|effect| effect.flee_modifier)
            .product()
    }
}
