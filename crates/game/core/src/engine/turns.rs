use tracing::debug;

use crate::state::{LogKind, ParticipantId, StatKind};

use super::{BattleEngine, EndReport, Replacement};

/// Turn scheduling methods for BattleEngine.
impl BattleEngine {
    /// Speed of a participant's active combatant after form, stage, status
    /// and field modifiers. Zero when there is no active combatant.
    pub fn effective_speed(&self, participant_id: &str) -> f64 {
        let Some(combatant) = self.session.active_combatant(participant_id) else {
            return 0.0;
        };
        self.effective_stat(combatant, StatKind::Speed)
            * combatant.status_speed_modifier()
            * self.session.field.speed_modifier()
    }

    /// Whether `participant_id` can still take turns.
    fn can_act(&self, participant_id: &str) -> bool {
        self.session
            .participant(participant_id)
            .is_some_and(|p| p.is_joined())
            && self.session.has_living_combatant(participant_id)
    }

    /// Hands the turn to the next participant able to act.
    ///
    /// Wrapping past the end of the turn order closes the round. Returns the
    /// end report when round processing ends the battle.
    pub(crate) fn advance_turn(&mut self) -> Option<EndReport> {
        let len = self.session.turn_order.len();
        if len == 0 {
            return None;
        }
        // Without a current holder nobody has acted yet, so the scan starts
        // at the head of the order and does not close a round.
        let current = self
            .session
            .current_turn
            .as_deref()
            .and_then(|current| self.session.turn_order.iter().position(|id| id == current));
        let (start, steps) = match current {
            Some(position) => (position + 1, len),
            None => (0, len),
        };

        for offset in 0..steps {
            let index = start + offset;
            if index == len && current.is_some() {
                if let Some(end) = self.end_of_round() {
                    return Some(end);
                }
            }
            let candidate = &self.session.turn_order[index % len];
            if self.can_act(candidate) {
                let next = candidate.clone();
                self.session.turn_number += 1;
                debug!(
                    target: "battle::engine",
                    battle = %self.session.id,
                    turn = self.session.turn_number,
                    next = %next,
                    "turn advanced"
                );
                self.session.current_turn = Some(next);
                return None;
            }
        }
        None
    }

    /// Ticks status effects and field state once all participants have acted.
    fn end_of_round(&mut self) -> Option<EndReport> {
        let weather = self.session.field.weather;
        let order: Vec<ParticipantId> = self.session.turn_order.clone();

        for participant_id in &order {
            let Some(combatant) = self.session.active_combatant_mut(participant_id) else {
                continue;
            };
            if !combatant.is_alive() {
                continue;
            }

            let mut lines = Vec::new();
            let name = combatant.display_name().to_owned();

            for effect in &mut combatant.status_effects {
                effect.turns_remaining = effect.turns_remaining.saturating_sub(1);
            }
            let recurring: Vec<(u32, u32)> = combatant
                .status_effects
                .iter()
                .map(|e| (e.recurring_damage.unwrap_or(0), e.recurring_heal.unwrap_or(0)))
                .collect();
            for (damage, heal) in recurring {
                if damage > 0 && combatant.is_alive() {
                    let lost = combatant.apply_damage(damage);
                    lines.push(format!("{name} lost {lost} HP to its condition"));
                }
                if heal > 0 && combatant.is_alive() {
                    let restored = combatant.heal(heal);
                    if restored > 0 {
                        lines.push(format!("{name} regained {restored} HP"));
                    }
                }
            }
            let expired: Vec<String> = combatant
                .status_effects
                .iter()
                .filter(|e| e.turns_remaining == 0)
                .map(|e| e.kind.to_string())
                .collect();
            combatant.status_effects.retain(|e| e.turns_remaining > 0);
            for kind in expired {
                lines.push(format!("{name} is no longer affected by {kind}"));
            }

            if let Some(divisor) = weather.chip_divisor(&combatant.types) {
                if combatant.is_alive() {
                    let lost = combatant.apply_damage((combatant.max_hp / divisor).max(1));
                    lines.push(format!("{name} is buffeted by the {weather} for {lost} HP"));
                }
            }
            if !combatant.is_alive() {
                lines.push(format!("{name} fainted"));
            }

            for line in lines {
                self.session
                    .push_log(LogKind::Status, Some(participant_id), line);
            }
        }

        let tick = self.session.field.tick();
        if let Some(ended) = tick.weather_ended {
            self.session
                .push_log(LogKind::Weather, None, format!("The {ended} subsided"));
        }
        for kind in tick.expired {
            self.session
                .push_log(LogKind::Weather, None, format!("{kind} wore off"));
        }

        self.session.round += 1;
        self.replace_fainted();
        self.check_winner()
    }

    /// Puts the first living combatant in for every fainted active one.
    pub(crate) fn replace_fainted(&mut self) -> Vec<Replacement> {
        let ids: Vec<ParticipantId> = self.session.participants.keys().cloned().collect();
        let mut replacements = Vec::new();

        for id in ids {
            let fainted = self
                .session
                .active_combatant(&id)
                .is_some_and(|c| !c.is_alive());
            if !fainted {
                continue;
            }
            let Some(slot) = self.session.first_living_slot(&id) else {
                continue;
            };
            self.session.active_slots.insert(id.clone(), slot);
            self.memo.clear_actor(&id);
            let name = self
                .session
                .combatant(&id, slot)
                .map(|c| c.display_name().to_owned())
                .unwrap_or_default();
            self.session
                .push_log(LogKind::Switch, Some(&id), format!("{id} sent out {name}"));
            replacements.push(Replacement {
                participant_id: id,
                slot,
            });
        }
        replacements
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::env::{ElementType, StaticGameData};
    use crate::state::{
        BattleSession, BattleType, Combatant, ParticipantFlags, ParticipantStatus, StatBlock,
    };

    use super::*;

    fn started() -> BattleEngine {
        let session = BattleSession::new("turns", BattleType::Pvp, 5, 1_700_000_000);
        let mut engine = BattleEngine::new(session, Arc::new(StaticGameData::new()));
        for (id, team, speed) in [("fast", 1, 30), ("slow", 2, 10)] {
            engine
                .add_participant(id, team, ParticipantFlags::PLAYER, ParticipantStatus::Joined)
                .unwrap();
            let combatant = Combatant::new(
                "pebblet",
                10,
                40,
                StatBlock {
                    attack: 20,
                    defense: 20,
                    special: 20,
                    speed,
                },
                vec![ElementType::Earth],
                std::iter::empty::<String>(),
            );
            engine.add_combatant(id, combatant, 0).unwrap();
        }
        engine.start_battle().unwrap();
        engine
    }

    #[test]
    fn wrapping_the_order_closes_a_round() {
        let mut engine = started();
        let round = engine.session.round;

        assert!(engine.advance_turn().is_none());
        assert_eq!(engine.session.current_turn.as_deref(), Some("slow"));
        assert_eq!(engine.session.round, round);

        assert!(engine.advance_turn().is_none());
        assert_eq!(engine.session.current_turn.as_deref(), Some("fast"));
        assert_eq!(engine.session.round, round + 1);
    }

    #[test]
    fn missing_current_turn_starts_at_the_head_without_a_round_tick() {
        let mut engine = started();
        let round = engine.session.round;
        let turn_number = engine.session.turn_number;
        engine.session.current_turn = None;

        assert!(engine.advance_turn().is_none());
        assert_eq!(engine.session.current_turn.as_deref(), Some("fast"));
        assert_eq!(engine.session.round, round);
        assert_eq!(engine.session.turn_number, turn_number + 1);
    }
}
