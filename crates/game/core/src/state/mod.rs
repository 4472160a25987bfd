//! Authoritative battle state.
//!
//! This module owns the session aggregate and everything it contains:
//! participants, rosters of combatants, status effects, weather and the event
//! log. Runtime layers clone or query this state but mutate it exclusively
//! through the engine.
mod combatant;
mod field;
mod log;
mod participant;
mod session;
mod status;
mod view;

pub use combatant::{Combatant, StatBlock, StatKind, StatStages, stage_multiplier};
pub use field::{FieldCondition, FieldConditionKind, FieldState, FieldTick, Weather};
pub use log::{BattleLogEntry, LogKind};
pub use participant::{Participant, ParticipantFlags, ParticipantStatus};
pub use session::{
    BattleOutcome, BattleSession, BattleStatus, BattleType, Rewards, Roster, empty_roster,
};
pub use status::{StatusEffect, StatusKind};
pub use view::{BattleStateView, CombatantView, ParticipantView};

/// Opaque participant identifier supplied by the host platform.
pub type ParticipantId = String;

/// Unix timestamp in seconds.
pub type Timestamp = i64;
