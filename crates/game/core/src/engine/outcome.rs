//! Win detection, forced endings and PvE rewards.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::BattleConfig;
use crate::state::{BattleOutcome, BattleStatus, BattleType, LogKind, ParticipantId, Rewards};

use super::{BattleEngine, BattleError, EndReport};

/// Base XP assumed for species missing from the catalog.
const FALLBACK_BASE_XP: u32 = 50;

impl BattleEngine {
    /// Ends the battle if at most one team still has a living combatant.
    ///
    /// A lone surviving participant wins under their own id; a surviving
    /// team of several wins as `team-<id>`. No survivors is a draw.
    pub(crate) fn check_winner(&mut self) -> Option<EndReport> {
        if !self.session.is_active() {
            return None;
        }

        let mut alive: BTreeMap<u32, Vec<ParticipantId>> = BTreeMap::new();
        for participant in self.session.participants.values() {
            if participant.is_joined() && self.session.has_living_combatant(&participant.id) {
                alive
                    .entry(participant.team_id)
                    .or_default()
                    .push(participant.id.clone());
            }
        }
        if alive.len() >= 2 {
            return None;
        }

        let winner = match alive.into_iter().next() {
            None => BattleConfig::DRAW.to_owned(),
            Some((team, members)) => match members.as_slice() {
                [only] => only.clone(),
                _ => self.team_winner_id(team),
            },
        };
        Some(self.complete(winner, "battle decided"))
    }

    /// Winner id for a team: the team's sole human in PvE, otherwise
    /// `team-<id>`.
    fn team_winner_id(&self, team: u32) -> String {
        let humans: Vec<&str> = self
            .session
            .participants
            .values()
            .filter(|p| p.team_id == team && !p.is_npc)
            .map(|p| p.id.as_str())
            .collect();
        match (self.session.battle_type, humans.as_slice()) {
            (BattleType::Pve, [only]) => (*only).to_owned(),
            _ => format!("team-{team}"),
        }
    }

    fn outcome_for(&self, winner: &str) -> BattleOutcome {
        if winner == BattleConfig::DRAW {
            return BattleOutcome::Draw;
        }
        if self.session.battle_type != BattleType::Pve {
            return BattleOutcome::Decided;
        }
        let npc_won = match self.session.participant(winner) {
            Some(p) => p.is_npc,
            None => winner
                .strip_prefix("team-")
                .and_then(|team| team.parse::<u32>().ok())
                .is_some_and(|team| {
                    self.session
                        .participants
                        .values()
                        .filter(|p| p.team_id == team)
                        .all(|p| p.is_npc)
                }),
        };
        if npc_won {
            BattleOutcome::Defeat
        } else {
            BattleOutcome::Victory
        }
    }

    fn complete(&mut self, winner: String, reason: &str) -> EndReport {
        let outcome = self.outcome_for(&winner);
        let rewards = match outcome {
            BattleOutcome::Victory => self.compute_rewards(&winner),
            _ => None,
        };

        self.session.transition(BattleStatus::Completed);
        self.session.winner_id = Some(winner.clone());
        self.session.outcome = Some(outcome);
        self.session.rewards = rewards.clone();
        self.session.end_reason = Some(reason.to_owned());
        self.session.current_turn = None;
        self.session.push_log(
            LogKind::Outcome,
            None,
            format!("Battle over ({outcome}); winner: {winner}"),
        );
        self.touch();

        info!(
            target: "battle::engine",
            battle = %self.session.id,
            winner = %winner,
            outcome = %outcome,
            "battle completed"
        );

        EndReport {
            status: self.session.status,
            winner_id: Some(winner),
            outcome: Some(outcome),
            rewards,
        }
    }

    /// Experience and tokens for defeating every NPC combatant.
    ///
    /// Per defeated combatant: `base_xp * level / 5` XP (at least 1) and
    /// `5 + 2 * level` tokens.
    pub fn compute_rewards(&self, recipient: &str) -> Option<Rewards> {
        let mut xp = 0u32;
        let mut tokens = 0u32;
        for participant in self.session.participants.values().filter(|p| p.is_npc) {
            let Some(roster) = self.session.roster(&participant.id) else {
                continue;
            };
            for combatant in roster.iter().flatten() {
                let base_xp = self
                    .data
                    .species(&combatant.species)
                    .map_or(FALLBACK_BASE_XP, |s| s.base_xp);
                xp = xp.saturating_add((base_xp * combatant.level / 5).max(1));
                tokens = tokens.saturating_add(5 + combatant.level * 2);
            }
        }
        (xp > 0).then(|| Rewards {
            recipient: recipient.to_owned(),
            xp,
            tokens,
        })
    }

    /// Force-ends the battle: completed when `winner` is given, otherwise
    /// cancelled.
    pub fn end_battle(
        &mut self,
        reason: &str,
        winner: Option<&str>,
    ) -> Result<EndReport, BattleError> {
        let from = self.session.status;
        let target = if winner.is_some() {
            BattleStatus::Completed
        } else {
            BattleStatus::Cancelled
        };
        if !from.can_transition_to(target) {
            return Err(BattleError::InvalidTransition { from, to: target });
        }

        if let Some(winner) = winner {
            return Ok(self.complete(winner.to_owned(), reason));
        }

        self.session.transition(BattleStatus::Cancelled);
        self.session.outcome = Some(BattleOutcome::Cancelled);
        self.session.end_reason = Some(reason.to_owned());
        self.session.current_turn = None;
        self.session
            .push_log(LogKind::Outcome, None, format!("Battle cancelled: {reason}"));
        self.touch();

        info!(
            target: "battle::engine",
            battle = %self.session.id,
            reason,
            "battle cancelled"
        );

        Ok(EndReport {
            status: self.session.status,
            winner_id: None,
            outcome: Some(BattleOutcome::Cancelled),
            rewards: None,
        })
    }
}
