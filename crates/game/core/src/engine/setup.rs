//! Roster assembly and battle start.

use tracing::{debug, info};

use crate::config::BattleConfig;
use crate::state::{
    BattleStatus, Combatant, LogKind, Participant, ParticipantFlags, ParticipantId,
    ParticipantStatus, empty_roster,
};

use super::{BattleEngine, BattleError, EndReport, StartReport};

impl BattleEngine {
    fn ensure_waiting(&self) -> Result<(), BattleError> {
        if self.session.status == BattleStatus::Waiting {
            Ok(())
        } else {
            Err(BattleError::NotWaiting(self.session.status))
        }
    }

    fn ensure_slot(slot: usize) -> Result<(), BattleError> {
        if slot < BattleConfig::MAX_SLOTS {
            Ok(())
        } else {
            Err(BattleError::SlotOutOfRange {
                slot,
                max: BattleConfig::MAX_SLOTS - 1,
            })
        }
    }

    pub fn add_participant(
        &mut self,
        id: &str,
        team_id: u32,
        flags: ParticipantFlags,
        status: ParticipantStatus,
    ) -> Result<(), BattleError> {
        self.ensure_waiting()?;
        if id.is_empty() {
            return Err(BattleError::EmptyParticipantId);
        }
        if self.session.participants.contains_key(id) {
            return Err(BattleError::DuplicateParticipant(id.to_owned()));
        }

        let join_order = self.session.allocate_join_order();
        let joined_at = (status == ParticipantStatus::Joined).then_some(self.now);
        self.session.participants.insert(
            id.to_owned(),
            Participant {
                id: id.to_owned(),
                team_id,
                is_host: flags.host,
                is_npc: flags.npc,
                status,
                joined_at,
                join_order,
            },
        );
        self.session
            .combatants
            .insert(id.to_owned(), empty_roster());
        self.touch();

        debug!(
            target: "battle::engine",
            battle = %self.session.id,
            participant = id,
            team = team_id,
            npc = flags.npc,
            "participant added"
        );
        Ok(())
    }

    /// Places a combatant into `slot`, replacing whatever was there.
    pub fn add_combatant(
        &mut self,
        participant_id: &str,
        combatant: Combatant,
        slot: usize,
    ) -> Result<(), BattleError> {
        self.ensure_waiting()?;
        if !self.session.participants.contains_key(participant_id) {
            return Err(BattleError::UnknownParticipant(participant_id.to_owned()));
        }
        Self::ensure_slot(slot)?;
        combatant.validate().map_err(BattleError::InvalidCombatant)?;

        let roster = self
            .session
            .combatants
            .entry(participant_id.to_owned())
            .or_insert_with(empty_roster);
        roster[slot] = Some(combatant);
        self.touch();
        Ok(())
    }

    /// Updates a participant's membership status.
    ///
    /// Before the battle starts any status may be set. Once it is running a
    /// participant can only leave, which forfeits their side if nobody else
    /// on the team is still standing.
    pub fn set_participant_status(
        &mut self,
        id: &str,
        status: ParticipantStatus,
    ) -> Result<Option<EndReport>, BattleError> {
        let current = self
            .session
            .participant(id)
            .ok_or_else(|| BattleError::UnknownParticipant(id.to_owned()))?
            .status;
        match self.session.status {
            BattleStatus::Waiting => {}
            BattleStatus::Active if status == ParticipantStatus::Left => {}
            other => return Err(BattleError::NotWaiting(other)),
        }
        if current == status {
            return Ok(None);
        }

        let now = self.now;
        if let Some(participant) = self.session.participant_mut(id) {
            participant.status = status;
            if status == ParticipantStatus::Joined {
                participant.joined_at = Some(now);
            }
        }
        self.session
            .push_log(LogKind::System, Some(id), format!("{id} is now {status}"));
        self.touch();

        if !self.session.is_active() {
            return Ok(None);
        }
        if let Some(end) = self.check_winner() {
            return Ok(Some(end));
        }
        if self.session.current_turn.as_deref() == Some(id) {
            return Ok(self.advance_turn());
        }
        Ok(None)
    }

    pub fn set_active_slot(&mut self, id: &str, slot: usize) -> Result<(), BattleError> {
        self.ensure_waiting()?;
        Self::ensure_slot(slot)?;
        let combatant = self
            .session
            .combatant(id, slot)
            .ok_or(BattleError::EmptySlot(slot))?;
        if !combatant.is_alive() {
            return Err(BattleError::FaintedCombatant(slot));
        }
        self.session.active_slots.insert(id.to_owned(), slot);
        self.touch();
        Ok(())
    }

    /// Validates the lineup, fixes the turn order and activates the battle.
    pub fn start_battle(&mut self) -> Result<StartReport, BattleError> {
        self.ensure_waiting()?;

        let mut picks: Vec<(ParticipantId, usize)> = Vec::new();
        for participant in self.session.participants.values() {
            if !participant.is_joined() {
                return Err(BattleError::NotJoined {
                    participant: participant.id.clone(),
                    status: participant.status,
                });
            }
            let chosen = self
                .session
                .active_slot(&participant.id)
                .filter(|slot| {
                    self.session
                        .combatant(&participant.id, *slot)
                        .is_some_and(Combatant::is_alive)
                })
                .or_else(|| self.session.first_living_slot(&participant.id))
                .ok_or_else(|| BattleError::NoLivingCombatant(participant.id.clone()))?;
            picks.push((participant.id.clone(), chosen));
        }
        if self.session.teams().len() < 2 {
            return Err(BattleError::NotEnoughTeams);
        }

        for (id, slot) in picks {
            self.session.active_slots.insert(id, slot);
        }

        let mut order: Vec<(ParticipantId, f64, u32)> = self
            .session
            .participants
            .values()
            .map(|p| (p.id.clone(), self.effective_speed(&p.id), p.join_order))
            .collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.2.cmp(&b.2)));
        let turn_order: Vec<ParticipantId> = order.into_iter().map(|(id, _, _)| id).collect();

        let first = turn_order[0].clone();
        self.session.turn_order = turn_order.clone();
        self.session.current_turn = Some(first.clone());
        self.session.turn_number = 1;
        self.session.round = 1;
        self.session.transition(BattleStatus::Active);
        self.session.push_log(
            LogKind::System,
            None,
            format!("Battle started; {first} moves first"),
        );
        self.touch();

        info!(
            target: "battle::engine",
            battle = %self.session.id,
            participants = turn_order.len(),
            first = %first,
            "battle started"
        );

        Ok(StartReport {
            turn_order,
            current_turn: first,
        })
    }
}
