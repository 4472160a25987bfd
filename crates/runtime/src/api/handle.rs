//! Cloneable façade for talking to one battle.
//!
//! [`BattleHandle`] pairs a battle id with its manager so presentation code
//! can send messages without tracking actor ids or session rows.
use std::sync::Arc;

use battle_core::{BattleStateView, ParticipantId, TurnAction};

use super::errors::Result;
use crate::battle::{ActionResponse, BattleManager, BattleMessage};

#[derive(Clone)]
pub struct BattleHandle {
    battle_id: Arc<str>,
    actor_id: Arc<str>,
    manager: Arc<BattleManager>,
}

impl BattleHandle {
    pub(crate) fn new(battle_id: &str, actor_id: &str, manager: Arc<BattleManager>) -> Self {
        Self {
            battle_id: Arc::from(battle_id),
            actor_id: Arc::from(actor_id),
            manager,
        }
    }

    pub fn battle_id(&self) -> &str {
        &self.battle_id
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// Sends `message` and waits for the reply.
    pub async fn send(&self, message: BattleMessage) -> Result<ActionResponse> {
        self.manager.send(&self.battle_id, message).await
    }

    /// Parses a JSON message, sends it and serializes the reply.
    pub async fn send_json(&self, json: &str) -> Result<String> {
        let message = BattleMessage::from_json(json)?;
        let response = self.send(message).await?;
        Ok(response.to_json()?)
    }

    /// Current read model of the battle.
    pub async fn state(&self) -> Result<Option<BattleStateView>> {
        Ok(self.send(BattleMessage::GetBattleState).await?.state)
    }

    pub async fn start(&self, user_id: Option<ParticipantId>) -> Result<ActionResponse> {
        self.send(BattleMessage::StartBattle { user_id }).await
    }

    /// Plays `turn` for `user_id`, then any NPC turns that follow.
    pub async fn take_turn(
        &self,
        user_id: impl Into<ParticipantId>,
        turn: TurnAction,
    ) -> Result<ActionResponse> {
        self.send(BattleMessage::ProcessTurn {
            user_id: Some(user_id.into()),
            turn: Some(turn),
        })
        .await
    }

    /// Force-ends the battle through the manager.
    pub async fn end(
        &self,
        reason: &str,
        winner_id: Option<&str>,
    ) -> Result<ActionResponse> {
        self.manager
            .end_battle(&self.battle_id, reason, winner_id)
            .await
    }
}

impl std::fmt::Debug for BattleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleHandle")
            .field("battle_id", &self.battle_id)
            .field("actor_id", &self.actor_id)
            .finish()
    }
}
