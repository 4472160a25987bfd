use serde::{Deserialize, Serialize};

use crate::state::ParticipantId;

use super::{ActionOutcome, BattleEngine, BattleError};

/// One turn's worth of input from a participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnAction {
    Move {
        move_name: String,
        #[serde(default)]
        target_ids: Vec<ParticipantId>,
    },
    Switch {
        slot: usize,
    },
    Item {
        item_id: String,
        #[serde(default)]
        target_id: Option<ParticipantId>,
    },
    Flee,
}

impl TurnAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnAction::Move { .. } => "move",
            TurnAction::Switch { .. } => "switch",
            TurnAction::Item { .. } => "item",
            TurnAction::Flee => "flee",
        }
    }
}

impl BattleEngine {
    /// Routes a turn action to the matching operation.
    pub fn process_action(
        &mut self,
        actor_id: &str,
        action: &TurnAction,
    ) -> Result<ActionOutcome, BattleError> {
        match action {
            TurnAction::Move {
                move_name,
                target_ids,
            } => self
                .execute_move(actor_id, move_name, target_ids)
                .map(ActionOutcome::Move),
            TurnAction::Switch { slot } => self
                .switch_combatant(actor_id, *slot)
                .map(ActionOutcome::Switch),
            TurnAction::Item { item_id, target_id } => self
                .use_item(actor_id, item_id, target_id.as_deref())
                .map(ActionOutcome::Item),
            TurnAction::Flee => self.attempt_flee(actor_id).map(ActionOutcome::Flee),
        }
    }
}
