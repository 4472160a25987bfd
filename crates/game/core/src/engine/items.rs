use tracing::debug;

use crate::env::ItemEffect;
use crate::state::LogKind;

use super::{BattleEngine, BattleError, ItemReport};

impl BattleEngine {
    /// Applies an item to the active combatant of `target_id` (the actor by
    /// default). Only the actor's own team can be targeted.
    pub fn use_item(
        &mut self,
        actor_id: &str,
        item_id: &str,
        target_id: Option<&str>,
    ) -> Result<ItemReport, BattleError> {
        self.ensure_turn(actor_id)?;
        let item = self
            .data
            .item(item_id)
            .ok_or_else(|| BattleError::UnknownItem(item_id.to_owned()))?;

        let target_id = target_id.unwrap_or(actor_id);
        let actor_team = self.session.participant(actor_id).map(|p| p.team_id);
        let target = self
            .session
            .participant(target_id)
            .ok_or_else(|| BattleError::UnknownTarget(target_id.to_owned()))?;
        if Some(target.team_id) != actor_team || !target.is_joined() {
            return Err(BattleError::InvalidTarget(target_id.to_owned()));
        }

        let mut report = ItemReport {
            actor_id: actor_id.to_owned(),
            item_id: item.id.clone(),
            target_id: target_id.to_owned(),
            hp_restored: 0,
            cured: Vec::new(),
            revived_slot: None,
            stage_delta: 0,
        };

        if let ItemEffect::Revive(percent) = item.effect {
            let slot = self
                .session
                .roster(target_id)
                .and_then(|roster| {
                    roster
                        .iter()
                        .position(|c| c.as_ref().is_some_and(|c| !c.is_alive()))
                })
                .ok_or_else(|| BattleError::ItemHasNoEffect(item.id.clone()))?;
            if let Some(combatant) = self.session.combatant_mut(target_id, slot) {
                report.hp_restored = combatant.revive(percent);
                report.revived_slot = Some(slot);
            }
        } else {
            let combatant = self
                .session
                .active_combatant_mut(target_id)
                .filter(|c| c.is_alive())
                .ok_or_else(|| BattleError::NoActiveCombatant(target_id.to_owned()))?;
            match item.effect {
                ItemEffect::Heal(amount) => report.hp_restored = combatant.heal(amount),
                ItemEffect::HealPercent(percent) => {
                    let amount = (combatant.max_hp * u32::from(percent) / 100).max(1);
                    report.hp_restored = combatant.heal(amount);
                }
                ItemEffect::Cure(Some(kind)) => {
                    if combatant.remove_status(kind) {
                        report.cured.push(kind);
                    }
                }
                ItemEffect::Cure(None) => report.cured = combatant.clear_harmful_statuses(),
                ItemEffect::StatBoost { stat, stages } => {
                    report.stage_delta = combatant.stages.apply(stat, stages);
                }
                ItemEffect::Revive(_) => {}
            }
        }

        self.session.push_log(
            LogKind::Item,
            Some(actor_id),
            format!("{actor_id} used {} on {target_id}", item.name),
        );
        debug!(
            target: "battle::engine",
            battle = %self.session.id,
            actor = actor_id,
            item = item_id,
            restored = report.hp_restored,
            "item used"
        );
        self.finish_action();
        Ok(report)
    }
}
