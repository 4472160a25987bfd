//! Status effects carried by combatants.
//!
//! Effects count down once per round. Recurring damage and healing are fixed
//! at infliction time from the target's max HP, so later max-HP changes (form
//! switches) do not rescale an effect already in place.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::ParticipantId;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatusKind {
    // ========================================================================
    // Harmful
    // ========================================================================
    /// Loses 1/16 max HP each round.
    Burn,
    /// Loses 1/8 max HP each round.
    Poison,
    /// Speed halved.
    Paralysis,
    /// Flee chance halved.
    Sleep,
    /// Speed quartered, cannot run.
    Freeze,
    /// Flee chance reduced.
    Confusion,
    /// Cannot run.
    Trapped,

    // ========================================================================
    // Beneficial
    // ========================================================================
    /// Regains 1/16 max HP each round.
    Regeneration,
    /// Speed and flee chance raised.
    Haste,
}

/// Modifier template applied when a status is inflicted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct StatusProfile {
    damage_divisor: Option<u32>,
    heal_divisor: Option<u32>,
    flee_modifier: Option<f64>,
    speed_modifier: Option<f64>,
}

impl StatusKind {
    pub fn is_harmful(self) -> bool {
        !matches!(self, StatusKind::Regeneration | StatusKind::Haste)
    }

    fn profile(self) -> StatusProfile {
        let base = StatusProfile::default();
        match self {
            StatusKind::Burn => StatusProfile {
                damage_divisor: Some(16),
                ..base
            },
            StatusKind::Poison => StatusProfile {
                damage_divisor: Some(8),
                ..base
            },
            StatusKind::Paralysis => StatusProfile {
                speed_modifier: Some(0.5),
                ..base
            },
            StatusKind::Sleep => StatusProfile {
                flee_modifier: Some(0.5),
                ..base
            },
            StatusKind::Freeze => StatusProfile {
                speed_modifier: Some(0.25),
                flee_modifier: Some(0.0),
                ..base
            },
            StatusKind::Confusion => StatusProfile {
                flee_modifier: Some(0.75),
                ..base
            },
            StatusKind::Trapped => StatusProfile {
                flee_modifier: Some(0.0),
                ..base
            },
            StatusKind::Regeneration => StatusProfile {
                heal_divisor: Some(16),
                ..base
            },
            StatusKind::Haste => StatusProfile {
                speed_modifier: Some(1.5),
                flee_modifier: Some(1.5),
                ..base
            },
        }
    }
}

/// An active status effect on a combatant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub turns_remaining: u32,
    /// Participant whose action caused the effect.
    pub source: Option<ParticipantId>,
    pub recurring_damage: Option<u32>,
    pub recurring_heal: Option<u32>,
    pub flee_modifier: Option<f64>,
    pub speed_modifier: Option<f64>,
}

impl StatusEffect {
    /// Builds an effect of `kind` sized against the target's max HP.
    pub fn inflict(
        kind: StatusKind,
        turns: u32,
        source: Option<ParticipantId>,
        target_max_hp: u32,
    ) -> Self {
        let profile = kind.profile();
        Self {
            kind,
            turns_remaining: turns.max(1),
            source,
            recurring_damage: profile
                .damage_divisor
                .map(|divisor| (target_max_hp / divisor).max(1)),
            recurring_heal: profile
                .heal_divisor
                .map(|divisor| (target_max_hp / divisor).max(1)),
            flee_modifier: profile.flee_modifier,
            speed_modifier: profile.speed_modifier,
        }
    }
}
