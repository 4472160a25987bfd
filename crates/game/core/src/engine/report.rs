//! Results returned by successful engine operations.

use serde::{Deserialize, Serialize};

use crate::state::{
    BattleOutcome, BattleSession, BattleStatus, ParticipantId, Rewards, StatKind, StatusKind,
    Weather,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartReport {
    pub turn_order: Vec<ParticipantId>,
    pub current_turn: ParticipantId,
}

/// Outcome of one move against one target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitReport {
    pub target_id: ParticipantId,
    pub missed: bool,
    pub damage: u32,
    pub effectiveness: f64,
    pub critical: bool,
    pub fainted: bool,
    pub remaining_hp: u32,
    pub status_inflicted: Option<StatusKind>,
}

/// A fainted active combatant replaced by the owner's next living one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub participant_id: ParticipantId,
    pub slot: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub participant_id: ParticipantId,
    pub stat: StatKind,
    pub delta: i8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveReport {
    pub actor_id: ParticipantId,
    pub move_name: String,
    pub hits: Vec<HitReport>,
    pub stage_changes: Vec<StageReport>,
    pub weather: Option<Weather>,
    pub replacements: Vec<Replacement>,
    pub end: Option<EndReport>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchReport {
    pub actor_id: ParticipantId,
    pub from_slot: Option<usize>,
    pub to_slot: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    pub actor_id: ParticipantId,
    pub item_id: String,
    pub target_id: ParticipantId,
    pub hp_restored: u32,
    pub cured: Vec<StatusKind>,
    pub revived_slot: Option<usize>,
    pub stage_delta: i8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleeReport {
    pub actor_id: ParticipantId,
    pub success: bool,
    pub chance: f64,
}

/// Terminal state reached by a battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndReport {
    pub status: BattleStatus,
    pub winner_id: Option<String>,
    pub outcome: Option<BattleOutcome>,
    pub rewards: Option<Rewards>,
}

impl EndReport {
    /// End state of `session`, `None` while it is still running.
    pub fn from_session(session: &BattleSession) -> Option<Self> {
        session.status.is_terminal().then(|| Self {
            status: session.status,
            winner_id: session.winner_id.clone(),
            outcome: session.outcome,
            rewards: session.rewards.clone(),
        })
    }
}

/// Result of a single turn action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionOutcome {
    Move(MoveReport),
    Switch(SwitchReport),
    Item(ItemReport),
    Flee(FleeReport),
}

impl ActionOutcome {
    pub fn actor_id(&self) -> &str {
        match self {
            ActionOutcome::Move(r) => &r.actor_id,
            ActionOutcome::Switch(r) => &r.actor_id,
            ActionOutcome::Item(r) => &r.actor_id,
            ActionOutcome::Flee(r) => &r.actor_id,
        }
    }
}
