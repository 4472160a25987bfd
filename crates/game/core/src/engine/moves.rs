use tracing::debug;

use crate::env::{EffectTarget, MoveCategory, MoveDefinition, RollKind};
use crate::state::{Combatant, LogKind, ParticipantId, StatKind, StatusEffect};

use super::damage::{DamageInput, calculate_damage, random_factor};
use super::{BattleEngine, BattleError, HitReport, MoveReport, StageReport};

impl BattleEngine {
    /// Uses one of the actor's known moves against `target_ids`.
    ///
    /// An empty target list aims at every opposing active combatant. A miss
    /// still consumes the turn.
    pub fn execute_move(
        &mut self,
        actor_id: &str,
        move_name: &str,
        target_ids: &[ParticipantId],
    ) -> Result<MoveReport, BattleError> {
        self.ensure_turn(actor_id)?;
        let attacker = self
            .session
            .active_combatant(actor_id)
            .filter(|c| c.is_alive())
            .cloned()
            .ok_or_else(|| BattleError::NoActiveCombatant(actor_id.to_owned()))?;
        let known = attacker
            .known_move(move_name)
            .ok_or_else(|| BattleError::MoveNotKnown {
                combatant: attacker.display_name().to_owned(),
                move_name: move_name.to_owned(),
            })?
            .to_owned();
        let definition = self
            .data
            .move_definition(&known)
            .ok_or_else(|| BattleError::UnknownMove(known.clone()))?;
        let targets = self.resolve_targets(actor_id, target_ids)?;

        // validated; mutations start here
        let mut hits = Vec::with_capacity(targets.len());
        let mut stage_changes = Vec::new();
        for target_id in &targets {
            let hit = self.resolve_hit(actor_id, &attacker, &definition, target_id);
            if !hit.missed {
                if let Some(change) = definition
                    .stage_change
                    .filter(|c| c.target == EffectTarget::Target)
                {
                    if let Some(report) = self.apply_stage(target_id, change.stat, change.stages) {
                        stage_changes.push(report);
                    }
                }
            }
            hits.push(hit);
        }

        let landed = hits.iter().any(|h| !h.missed);
        if landed {
            if let Some(change) = definition
                .stage_change
                .filter(|c| c.target == EffectTarget::User)
            {
                if let Some(report) = self.apply_stage(actor_id, change.stat, change.stages) {
                    stage_changes.push(report);
                }
            }
            if let Some(weather) = definition.sets_weather {
                self.session
                    .field
                    .set_weather(weather, self.config.weather_turns);
                self.session.push_log(
                    LogKind::Weather,
                    Some(actor_id),
                    format!("The weather turned to {weather}"),
                );
            }
            if let Some(kind) = definition.field_condition {
                self.session
                    .field
                    .add_condition(kind, self.config.weather_turns);
                self.session.push_log(
                    LogKind::Weather,
                    Some(actor_id),
                    format!("{kind} covers the field"),
                );
            }
        }

        self.session.push_log(
            LogKind::Move,
            Some(actor_id),
            describe_move(&attacker, &known, &hits),
        );
        let replacements = self.replace_fainted();
        let end = self.finish_action();

        debug!(
            target: "battle::engine",
            battle = %self.session.id,
            actor = actor_id,
            move_name = %known,
            targets = hits.len(),
            ended = end.is_some(),
            "move executed"
        );

        Ok(MoveReport {
            actor_id: actor_id.to_owned(),
            move_name: known,
            hits,
            stage_changes,
            weather: definition.sets_weather.filter(|_| landed),
            replacements,
            end,
        })
    }

    fn resolve_targets(
        &self,
        actor_id: &str,
        target_ids: &[ParticipantId],
    ) -> Result<Vec<ParticipantId>, BattleError> {
        let team = self
            .session
            .participant(actor_id)
            .map(|p| p.team_id)
            .ok_or_else(|| BattleError::UnknownParticipant(actor_id.to_owned()))?;
        let targetable = |id: &str| {
            self.session
                .active_combatant(id)
                .is_some_and(Combatant::is_alive)
        };

        if target_ids.is_empty() {
            let targets: Vec<ParticipantId> = self
                .session
                .opponents_of(actor_id)
                .into_iter()
                .filter(|id| targetable(id))
                .collect();
            if targets.is_empty() {
                return Err(BattleError::NoTargets);
            }
            return Ok(targets);
        }

        let mut targets: Vec<ParticipantId> = Vec::with_capacity(target_ids.len());
        for id in target_ids {
            let participant = self
                .session
                .participant(id)
                .ok_or_else(|| BattleError::UnknownTarget(id.clone()))?;
            if participant.team_id == team || !participant.is_joined() || !targetable(id) {
                return Err(BattleError::InvalidTarget(id.clone()));
            }
            if !targets.contains(id) {
                targets.push(id.clone());
            }
        }
        Ok(targets)
    }

    fn offense_defense(
        &self,
        attacker: &Combatant,
        defender: &Combatant,
        category: MoveCategory,
    ) -> (f64, f64) {
        match category {
            MoveCategory::Special => (
                self.effective_stat(attacker, StatKind::Special),
                self.effective_stat(defender, StatKind::Special),
            ),
            _ => (
                self.effective_stat(attacker, StatKind::Attack),
                self.effective_stat(defender, StatKind::Defense),
            ),
        }
    }

    fn effectiveness(
        &mut self,
        actor_id: &str,
        definition: &MoveDefinition,
        target_id: &str,
    ) -> f64 {
        let Some(slot) = self.session.active_slot(target_id) else {
            return 1.0;
        };
        if let Some(cached) = self.memo.get(actor_id, definition.element, target_id, slot) {
            return cached;
        }
        let types = self
            .session
            .combatant(target_id, slot)
            .map(|c| c.types.clone())
            .unwrap_or_default();
        let value = self.data.effectiveness_against(definition.element, &types);
        self.memo
            .insert(actor_id, definition.element, target_id, slot, value);
        value
    }

    fn resolve_hit(
        &mut self,
        actor_id: &str,
        attacker: &Combatant,
        definition: &MoveDefinition,
        target_id: &str,
    ) -> HitReport {
        let mut hit = HitReport {
            target_id: target_id.to_owned(),
            missed: false,
            damage: 0,
            effectiveness: 1.0,
            critical: false,
            fainted: false,
            remaining_hp: 0,
            status_inflicted: None,
        };

        if definition.accuracy < 100 {
            let roll = self.roll_d100(RollKind::Accuracy);
            hit.missed = roll > u32::from(definition.accuracy);
        }

        if !hit.missed && definition.is_damaging() {
            hit.effectiveness = self.effectiveness(actor_id, definition, target_id);
            hit.critical = self.roll_d100(RollKind::Critical) <= self.config.critical_chance;
            let variance = random_factor(self.roll_unit(RollKind::DamageVariance));

            if let Some(defender) = self.session.active_combatant(target_id) {
                let (attack, defense) =
                    self.offense_defense(attacker, defender, definition.category);
                hit.damage = calculate_damage(DamageInput {
                    level: attacker.level,
                    power: definition.power,
                    attack,
                    defense,
                    effectiveness: hit.effectiveness,
                    critical: hit.critical,
                    random_factor: variance,
                    weather: self.session.field.weather.damage_modifier(definition.element),
                });
            }
        }

        let status_roll = match definition.inflicts {
            Some(inflicts) if !hit.missed => {
                Some((inflicts, self.roll_d100(RollKind::StatusChance)))
            }
            _ => None,
        };

        if let Some(defender) = self.session.active_combatant_mut(target_id) {
            if hit.damage > 0 {
                hit.damage = defender.apply_damage(hit.damage);
            }
            if let Some((inflicts, roll)) = status_roll {
                if defender.is_alive() && roll <= u32::from(inflicts.chance) {
                    let effect = StatusEffect::inflict(
                        inflicts.kind,
                        inflicts.turns,
                        Some(actor_id.to_owned()),
                        defender.max_hp,
                    );
                    if defender.add_status(effect) {
                        hit.status_inflicted = Some(inflicts.kind);
                    }
                }
            }
            hit.fainted = !defender.is_alive();
            hit.remaining_hp = defender.current_hp;
        }
        hit
    }

    fn apply_stage(
        &mut self,
        participant_id: &str,
        stat: StatKind,
        stages: i8,
    ) -> Option<StageReport> {
        let combatant = self.session.active_combatant_mut(participant_id)?;
        if !combatant.is_alive() {
            return None;
        }
        let delta = combatant.stages.apply(stat, stages);
        Some(StageReport {
            participant_id: participant_id.to_owned(),
            stat,
            delta,
        })
    }
}

fn describe_move(attacker: &Combatant, move_name: &str, hits: &[HitReport]) -> String {
    let mut line = format!("{} used {move_name}", attacker.display_name());
    for hit in hits {
        if hit.missed {
            line.push_str(&format!("; missed {}", hit.target_id));
            continue;
        }
        if hit.damage > 0 {
            line.push_str(&format!("; hit {} for {}", hit.target_id, hit.damage));
            if hit.critical {
                line.push_str(" (critical)");
            }
        }
        if let Some(kind) = hit.status_inflicted {
            line.push_str(&format!("; {} is afflicted by {kind}", hit.target_id));
        }
        if hit.fainted {
            line.push_str(&format!("; {}'s combatant fainted", hit.target_id));
        }
    }
    line
}
