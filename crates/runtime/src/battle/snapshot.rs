//! Binary snapshot of a battle actor.

use battle_core::{BattleSession, BattleType, ParticipantId};
use serde::{Deserialize, Serialize};

use crate::api::SnapshotError;

/// Everything needed to rebuild a battle actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub battle_id: String,
    pub battle_type: BattleType,
    pub host_id: Option<ParticipantId>,
    pub session: BattleSession,
    /// Unix seconds of the last handled message.
    pub last_activity: i64,
}

impl BattleSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))
    }
}
