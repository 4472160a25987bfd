//! Error types surfaced by battle operations.

use crate::state::{BattleStatus, ParticipantStatus};

/// Broad category of a [`BattleError`], used by callers to pick a log level
/// and a response shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was well-formed but not allowed in the current state.
    Validation,
    /// The request referenced something that does not exist.
    NotFound,
}

/// Errors surfaced while mutating a battle through the engine.
///
/// Every failing operation leaves the session untouched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    #[error("battle is not waiting for players (status: {0})")]
    NotWaiting(BattleStatus),

    #[error("battle is not active (status: {0})")]
    NotActive(BattleStatus),

    #[error("cannot move battle from {from} to {to}")]
    InvalidTransition { from: BattleStatus, to: BattleStatus },

    #[error("participant id must not be empty")]
    EmptyParticipantId,

    #[error("participant {0} is already in the battle")]
    DuplicateParticipant(String),

    #[error("participant {0} is not in the battle")]
    UnknownParticipant(String),

    #[error("participant {participant} has not joined (status: {status})")]
    NotJoined {
        participant: String,
        status: ParticipantStatus,
    },

    #[error("participant {0} has no living combatant")]
    NoLivingCombatant(String),

    #[error("participant {0} has no active combatant")]
    NoActiveCombatant(String),

    #[error("a battle needs at least two teams")]
    NotEnoughTeams,

    #[error("slot {slot} is out of range (max {max})")]
    SlotOutOfRange { slot: usize, max: usize },

    #[error("slot {0} is empty")]
    EmptySlot(usize),

    #[error("slot {0} is already active")]
    SlotAlreadyActive(usize),

    #[error("combatant in slot {0} has fainted")]
    FaintedCombatant(usize),

    #[error("invalid combatant: {0}")]
    InvalidCombatant(String),

    #[error("it is not {actor}'s turn (current: {current})")]
    NotYourTurn { actor: String, current: String },

    #[error("{combatant} does not know {move_name}")]
    MoveNotKnown { combatant: String, move_name: String },

    #[error("move {0} is not defined")]
    UnknownMove(String),

    #[error("item {0} is not defined")]
    UnknownItem(String),

    #[error("target {0} is not in the battle")]
    UnknownTarget(String),

    #[error("{0} cannot be targeted")]
    InvalidTarget(String),

    #[error("no valid targets")]
    NoTargets,

    #[error("item {0} would have no effect")]
    ItemHasNoEffect(String),

    #[error("fleeing is only possible in PvE battles")]
    FleeNotAllowed,
}

impl BattleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BattleError::UnknownParticipant(_)
            | BattleError::UnknownMove(_)
            | BattleError::UnknownItem(_)
            | BattleError::UnknownTarget(_)
            | BattleError::EmptySlot(_) => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }

    pub fn not_your_turn(actor: &str, current: Option<&str>) -> Self {
        BattleError::NotYourTurn {
            actor: actor.to_owned(),
            current: current.unwrap_or("nobody").to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_not_found_failures() {
        assert_eq!(
            BattleError::UnknownItem("elixir".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BattleError::not_your_turn("p2", Some("p1")).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn messages_name_the_offender() {
        let err = BattleError::not_your_turn("p2", Some("p1"));
        assert_eq!(err.to_string(), "it is not p2's turn (current: p1)");
    }
}
