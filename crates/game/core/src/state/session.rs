//! The battle session aggregate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{
    BattleLogEntry, Combatant, FieldState, LogKind, Participant, ParticipantId, Timestamp,
};
use crate::config::BattleConfig;

/// Fixed roster of combatant slots owned by one participant.
pub type Roster = [Option<Combatant>; BattleConfig::MAX_SLOTS];

pub fn empty_roster() -> Roster {
    Default::default()
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum BattleType {
    #[default]
    Pvp,
    Pve,
    Multi,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum BattleStatus {
    #[default]
    Waiting,
    Active,
    Completed,
    Cancelled,
}

impl BattleStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BattleStatus::Completed | BattleStatus::Cancelled)
    }

    /// Status only moves forward: Waiting → Active → {Completed, Cancelled},
    /// and a battle may be cancelled before it starts.
    pub fn can_transition_to(self, next: BattleStatus) -> bool {
        matches!(
            (self, next),
            (BattleStatus::Waiting, BattleStatus::Active)
                | (BattleStatus::Waiting, BattleStatus::Cancelled)
                | (BattleStatus::Active, BattleStatus::Completed)
                | (BattleStatus::Active, BattleStatus::Cancelled)
        )
    }
}

/// Human-facing label for how a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    /// The human side won a PvE battle.
    Victory,
    /// The NPC side won a PvE battle.
    Defeat,
    Draw,
    /// A PvP or multi battle with a winner.
    Decided,
    Fled,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    pub recipient: ParticipantId,
    pub xp: u32,
    pub tokens: u32,
}

/// Complete state of one battle.
///
/// Mutated only through [`crate::BattleEngine`]; the runtime snapshots the
/// whole struct.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleSession {
    pub id: String,
    pub battle_type: BattleType,
    pub status: BattleStatus,
    pub participants: BTreeMap<ParticipantId, Participant>,
    pub combatants: BTreeMap<ParticipantId, Roster>,
    pub active_slots: BTreeMap<ParticipantId, usize>,
    /// Fixed once the battle starts.
    pub turn_order: Vec<ParticipantId>,
    pub current_turn: Option<ParticipantId>,
    pub turn_number: u32,
    /// Completed passes over the turn order plus one.
    pub round: u32,
    pub winner_id: Option<String>,
    pub outcome: Option<BattleOutcome>,
    pub rewards: Option<Rewards>,
    pub log: Vec<BattleLogEntry>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub field: FieldState,
    pub seed: u64,
    /// Incremented once per random roll.
    pub nonce: u64,
    pub end_reason: Option<String>,
    next_join_order: u32,
}

impl BattleSession {
    pub fn new(id: impl Into<String>, battle_type: BattleType, seed: u64, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            battle_type,
            status: BattleStatus::Waiting,
            participants: BTreeMap::new(),
            combatants: BTreeMap::new(),
            active_slots: BTreeMap::new(),
            turn_order: Vec::new(),
            current_turn: None,
            turn_number: 0,
            round: 0,
            winner_id: None,
            outcome: None,
            rewards: None,
            log: Vec::new(),
            created_at: now,
            updated_at: now,
            expires_at: None,
            field: FieldState::default(),
            seed,
            nonce: 0,
            end_reason: None,
            next_join_order: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BattleStatus::Active
    }

    pub fn host_id(&self) -> Option<&str> {
        self.participants
            .values()
            .find(|p| p.is_host)
            .map(|p| p.id.as_str())
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn participant_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.participants.get_mut(id)
    }

    pub(crate) fn allocate_join_order(&mut self) -> u32 {
        let order = self.next_join_order;
        self.next_join_order += 1;
        order
    }

    pub fn roster(&self, id: &str) -> Option<&Roster> {
        self.combatants.get(id)
    }

    pub fn active_slot(&self, id: &str) -> Option<usize> {
        self.active_slots.get(id).copied()
    }

    pub fn combatant(&self, id: &str, slot: usize) -> Option<&Combatant> {
        self.combatants.get(id)?.get(slot)?.as_ref()
    }

    pub fn combatant_mut(&mut self, id: &str, slot: usize) -> Option<&mut Combatant> {
        self.combatants.get_mut(id)?.get_mut(slot)?.as_mut()
    }

    pub fn active_combatant(&self, id: &str) -> Option<&Combatant> {
        self.combatant(id, self.active_slot(id)?)
    }

    pub fn active_combatant_mut(&mut self, id: &str) -> Option<&mut Combatant> {
        let slot = self.active_slot(id)?;
        self.combatant_mut(id, slot)
    }

    pub fn first_living_slot(&self, id: &str) -> Option<usize> {
        self.combatants
            .get(id)?
            .iter()
            .position(|slot| slot.as_ref().is_some_and(Combatant::is_alive))
    }

    pub fn has_living_combatant(&self, id: &str) -> bool {
        self.first_living_slot(id).is_some()
    }

    /// Joined participants on a different team than `id`.
    pub fn opponents_of(&self, id: &str) -> Vec<ParticipantId> {
        let Some(team) = self.participant(id).map(|p| p.team_id) else {
            return Vec::new();
        };
        self.participants
            .values()
            .filter(|p| p.is_joined() && p.team_id != team)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Distinct team ids among joined participants.
    pub fn teams(&self) -> Vec<u32> {
        let mut teams: Vec<u32> = self
            .participants
            .values()
            .filter(|p| p.is_joined())
            .map(|p| p.team_id)
            .collect();
        teams.sort_unstable();
        teams.dedup();
        teams
    }

    /// Moves the status forward; returns false for a disallowed transition.
    pub fn transition(&mut self, next: BattleStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        true
    }

    /// Returns the nonce for the next random roll.
    pub fn next_nonce(&mut self) -> u64 {
        let nonce = self.nonce;
        self.nonce = self.nonce.wrapping_add(1);
        nonce
    }

    pub fn push_log(
        &mut self,
        kind: LogKind,
        actor: Option<&str>,
        message: impl Into<String>,
    ) {
        if self.log.len() >= BattleConfig::MAX_LOG_ENTRIES {
            let overflow = self.log.len() + 1 - BattleConfig::MAX_LOG_ENTRIES;
            self.log.drain(..overflow);
        }
        self.log.push(BattleLogEntry {
            turn: self.turn_number,
            kind,
            actor: actor.map(str::to_owned),
            message: message.into(),
        });
    }
}
