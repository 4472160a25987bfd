//! Deterministic battle rules and data types.
//!
//! `battle-core` defines the canonical rules for creature battles (session
//! state, turn order, damage, status effects, win detection) as pure,
//! synchronous APIs. All state mutation flows through
//! [`engine::BattleEngine`]; static data is read through the oracle traits in
//! [`env`], which the runtime backs with caches.
pub mod config;
pub mod engine;
pub mod env;
pub mod state;

pub use config::BattleConfig;
pub use engine::{
    ActionOutcome, BattleEngine, BattleError, DamageInput, EndReport, ErrorKind, FleeReport,
    HitReport, ItemReport, MoveReport, Replacement, StageReport, StartReport, SwitchReport,
    TurnAction, calculate_damage,
};
pub use env::{
    ElementType, GameDataOracle, ItemDefinition, ItemEffect, ItemOracle, MoveDefinition,
    MoveOracle, SpeciesOracle, SpeciesTemplate, StaticGameData, TypeChartOracle,
};
pub use state::{
    BattleOutcome, BattleSession, BattleStateView, BattleStatus, BattleType, Combatant,
    Participant, ParticipantFlags, ParticipantId, ParticipantStatus, Rewards, StatBlock, StatKind,
    StatusEffect, StatusKind, Timestamp, Weather,
};
