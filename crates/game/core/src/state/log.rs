use serde::{Deserialize, Serialize};
use strum::Display;

use super::ParticipantId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LogKind {
    System,
    Move,
    Switch,
    Item,
    Flee,
    Status,
    Weather,
    Faint,
    Outcome,
}

/// One line of the battle event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleLogEntry {
    pub turn: u32,
    pub kind: LogKind,
    pub actor: Option<ParticipantId>,
    pub message: String,
}
