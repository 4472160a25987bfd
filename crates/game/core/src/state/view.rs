//! Serializable read model of a session for presentation layers.

use serde::{Deserialize, Serialize};

use super::{
    BattleLogEntry, BattleOutcome, BattleSession, BattleStatus, BattleType, Combatant,
    ParticipantId, ParticipantStatus, Rewards, StatusKind, Weather,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatantView {
    pub slot: usize,
    pub species: String,
    pub name: String,
    pub level: u32,
    pub current_hp: u32,
    pub max_hp: u32,
    pub moves: Vec<String>,
    pub statuses: Vec<StatusKind>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub team_id: u32,
    pub is_host: bool,
    pub is_npc: bool,
    pub status: ParticipantStatus,
    pub combatants: Vec<CombatantView>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleStateView {
    pub battle_id: String,
    pub battle_type: BattleType,
    pub status: BattleStatus,
    pub turn_number: u32,
    pub round: u32,
    pub current_turn: Option<ParticipantId>,
    pub turn_order: Vec<ParticipantId>,
    pub weather: Weather,
    pub participants: Vec<ParticipantView>,
    pub winner_id: Option<String>,
    pub outcome: Option<BattleOutcome>,
    pub rewards: Option<Rewards>,
    /// Most recent log entries, oldest first.
    pub recent_log: Vec<BattleLogEntry>,
}

impl BattleStateView {
    pub const RECENT_LOG_ENTRIES: usize = 10;

    pub fn from_session(session: &BattleSession) -> Self {
        let participants = session
            .participants
            .values()
            .map(|p| {
                let active = session.active_slot(&p.id);
                let combatants = session
                    .roster(&p.id)
                    .map(|roster| {
                        roster
                            .iter()
                            .enumerate()
                            .filter_map(|(slot, c)| {
                                c.as_ref()
                                    .map(|c| combatant_view(slot, c, active == Some(slot)))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                ParticipantView {
                    id: p.id.clone(),
                    team_id: p.team_id,
                    is_host: p.is_host,
                    is_npc: p.is_npc,
                    status: p.status,
                    combatants,
                }
            })
            .collect();

        let skip = session.log.len().saturating_sub(Self::RECENT_LOG_ENTRIES);
        Self {
            battle_id: session.id.clone(),
            battle_type: session.battle_type,
            status: session.status,
            turn_number: session.turn_number,
            round: session.round,
            current_turn: session.current_turn.clone(),
            turn_order: session.turn_order.clone(),
            weather: session.field.weather,
            participants,
            winner_id: session.winner_id.clone(),
            outcome: session.outcome,
            rewards: session.rewards.clone(),
            recent_log: session.log[skip..].to_vec(),
        }
    }
}

fn combatant_view(slot: usize, c: &Combatant, active: bool) -> CombatantView {
    CombatantView {
        slot,
        species: c.species.clone(),
        name: c.display_name().to_owned(),
        level: c.level,
        current_hp: c.current_hp,
        max_hp: c.max_hp,
        moves: c.moves.to_vec(),
        statuses: c.status_effects.iter().map(|e| e.kind).collect(),
        active,
    }
}
