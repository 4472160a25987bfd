//! Wire shapes exchanged with a battle actor.
//!
//! Messages arrive as JSON objects tagged by `action`, e.g.
//!
//! ```json
//! {"action": "execute_move", "user_id": "ash", "move_name": "tackle", "target_ids": ["gary"]}
//! ```
//!
//! and every message is answered with an [`ActionResponse`].

use battle_core::{
    ActionOutcome, BattleError, BattleStateView, BattleStatus, EndReport, ErrorKind,
    ParticipantId, ParticipantStatus, StartReport, TurnAction,
};
use serde::{Deserialize, Serialize};

use crate::api::ActorFailure;

/// Combatant described by species and level; stats come from the template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantSpec {
    pub species: String,
    pub level: u32,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
}

impl CombatantSpec {
    pub fn new(species: impl Into<String>, level: u32) -> Self {
        Self {
            species: species.into(),
            level,
            nickname: None,
            form: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BattleMessage {
    /// Starts the battle. When `user_id` is given it must be the host.
    StartBattle {
        #[serde(default)]
        user_id: Option<ParticipantId>,
    },
    ExecuteMove {
        user_id: ParticipantId,
        move_name: String,
        #[serde(default)]
        target_ids: Vec<ParticipantId>,
    },
    /// Switches the active combatant to roster slot `veramon_id`.
    SwitchVeramon {
        user_id: ParticipantId,
        veramon_id: usize,
    },
    UseItem {
        user_id: ParticipantId,
        item_id: String,
        #[serde(default)]
        target_id: Option<ParticipantId>,
    },
    AttemptFlee {
        user_id: ParticipantId,
    },
    /// Applies `turn` for `user_id` (if any), then plays NPC turns until a
    /// human is up or the battle ends.
    ProcessTurn {
        #[serde(default)]
        user_id: Option<ParticipantId>,
        #[serde(default)]
        turn: Option<TurnAction>,
    },
    EndBattle {
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        winner_id: Option<ParticipantId>,
    },
    GetBattleState,
    AddParticipant {
        user_id: ParticipantId,
        team_id: u32,
        #[serde(default)]
        is_host: bool,
        #[serde(default)]
        is_npc: bool,
        #[serde(default)]
        status: ParticipantStatus,
    },
    AddCombatant {
        user_id: ParticipantId,
        slot: usize,
        combatant: CombatantSpec,
    },
    SetParticipantStatus {
        user_id: ParticipantId,
        status: ParticipantStatus,
    },
}

/// Operation label used for metrics and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    StartBattle,
    ExecuteMove,
    SwitchVeramon,
    UseItem,
    AttemptFlee,
    ProcessTurn,
    EndBattle,
    GetBattleState,
    AddParticipant,
    AddCombatant,
    SetParticipantStatus,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::StartBattle,
        Operation::ExecuteMove,
        Operation::SwitchVeramon,
        Operation::UseItem,
        Operation::AttemptFlee,
        Operation::ProcessTurn,
        Operation::EndBattle,
        Operation::GetBattleState,
        Operation::AddParticipant,
        Operation::AddCombatant,
        Operation::SetParticipantStatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::StartBattle => "start_battle",
            Operation::ExecuteMove => "execute_move",
            Operation::SwitchVeramon => "switch_veramon",
            Operation::UseItem => "use_item",
            Operation::AttemptFlee => "attempt_flee",
            Operation::ProcessTurn => "process_turn",
            Operation::EndBattle => "end_battle",
            Operation::GetBattleState => "get_battle_state",
            Operation::AddParticipant => "add_participant",
            Operation::AddCombatant => "add_combatant",
            Operation::SetParticipantStatus => "set_participant_status",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Whether a successful call changes the session.
    pub fn mutates(self) -> bool {
        !matches!(self, Operation::GetBattleState)
    }
}

impl BattleMessage {
    pub fn operation(&self) -> Operation {
        match self {
            BattleMessage::StartBattle { .. } => Operation::StartBattle,
            BattleMessage::ExecuteMove { .. } => Operation::ExecuteMove,
            BattleMessage::SwitchVeramon { .. } => Operation::SwitchVeramon,
            BattleMessage::UseItem { .. } => Operation::UseItem,
            BattleMessage::AttemptFlee { .. } => Operation::AttemptFlee,
            BattleMessage::ProcessTurn { .. } => Operation::ProcessTurn,
            BattleMessage::EndBattle { .. } => Operation::EndBattle,
            BattleMessage::GetBattleState => Operation::GetBattleState,
            BattleMessage::AddParticipant { .. } => Operation::AddParticipant,
            BattleMessage::AddCombatant { .. } => Operation::AddCombatant,
            BattleMessage::SetParticipantStatus { .. } => Operation::SetParticipantStatus,
        }
    }

    /// Parses a JSON message.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Why a message was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    NotFound,
    Internal,
}

impl From<ErrorKind> for FailureKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => FailureKind::Validation,
            ErrorKind::NotFound => FailureKind::NotFound,
        }
    }
}

/// Reply to every [`BattleMessage`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Battle status after the message; absent when the handler crashed.
    #[serde(default)]
    pub status: Option<BattleStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<StartReport>,
    /// Turn actions applied, including NPC turns played by `process_turn`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<ActionOutcome>,
    /// Set when this message ended the battle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended: Option<EndReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<BattleStateView>,
}

impl ActionResponse {
    pub fn ok(status: BattleStatus) -> Self {
        Self {
            success: true,
            reason: None,
            failure: None,
            status: Some(status),
            started: None,
            outcomes: Vec::new(),
            ended: None,
            state: None,
        }
    }

    pub fn rejected(status: BattleStatus, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            failure: Some(kind),
            ..Self::ok(status)
        }
    }

    pub fn from_error(status: BattleStatus, error: &BattleError) -> Self {
        Self::rejected(status, error.kind().into(), error.to_string())
    }

    pub fn internal(failure: &ActorFailure) -> Self {
        Self {
            success: false,
            reason: Some(failure.to_string()),
            failure: Some(FailureKind::Internal),
            status: None,
            started: None,
            outcomes: Vec::new(),
            ended: None,
            state: None,
        }
    }

    pub fn with_state(mut self, state: BattleStateView) -> Self {
        self.state = Some(state);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_parse_from_tagged_json() {
        let message = BattleMessage::from_json(
            r#"{"action":"execute_move","user_id":"ash","move_name":"tackle","target_ids":["gary"]}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            BattleMessage::ExecuteMove {
                user_id: "ash".into(),
                move_name: "tackle".into(),
                target_ids: vec!["gary".into()],
            }
        );

        let message =
            BattleMessage::from_json(r#"{"action":"switch_veramon","user_id":"ash","veramon_id":2}"#)
                .unwrap();
        assert_eq!(message.operation(), Operation::SwitchVeramon);

        let message = BattleMessage::from_json(r#"{"action":"get_battle_state"}"#).unwrap();
        assert_eq!(message, BattleMessage::GetBattleState);
    }

    #[test]
    fn process_turn_carries_a_tagged_turn_action() {
        let message = BattleMessage::from_json(
            r#"{"action":"process_turn","user_id":"ash","turn":{"type":"item","item_id":"potion"}}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            BattleMessage::ProcessTurn {
                user_id: Some("ash".into()),
                turn: Some(TurnAction::Item {
                    item_id: "potion".into(),
                    target_id: None,
                }),
            }
        );
    }

    #[test]
    fn participant_status_defaults_to_invited() {
        let message = BattleMessage::from_json(
            r#"{"action":"add_participant","user_id":"misty","team_id":2}"#,
        )
        .unwrap();
        let BattleMessage::AddParticipant { status, is_host, .. } = message else {
            panic!("wrong variant");
        };
        assert_eq!(status, ParticipantStatus::Invited);
        assert!(!is_host);
    }

    #[test]
    fn unknown_actions_are_rejected() {
        assert!(BattleMessage::from_json(r#"{"action":"dance","user_id":"ash"}"#).is_err());
    }

    #[test]
    fn failures_serialize_with_reason() {
        let response = ActionResponse::from_error(
            BattleStatus::Active,
            &BattleError::UnknownItem("elixir".into()),
        );
        let json = response.to_json().unwrap();
        assert!(json.contains(r#""success":false"#));
        assert!(json.contains(r#""failure":"not_found""#));
        assert!(json.contains("elixir"));
    }

    #[test]
    fn operation_indices_are_dense() {
        for (i, op) in Operation::ALL.iter().enumerate() {
            assert_eq!(op.index(), i);
        }
    }
}
