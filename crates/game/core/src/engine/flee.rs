use tracing::info;

use crate::env::RollKind;
use crate::state::{BattleOutcome, BattleStatus, BattleType, LogKind};

use super::{BattleEngine, BattleError, FleeReport};

impl BattleEngine {
    /// Chance that `actor_id` escapes right now, in `[0, 1]`.
    pub fn flee_chance(&self, actor_id: &str) -> f64 {
        let status = self
            .session
            .active_combatant(actor_id)
            .map_or(1.0, |c| c.status_flee_modifier());
        (self.config.base_flee_chance * status * self.session.field.flee_modifier()).clamp(0.0, 1.0)
    }

    /// Tries to run from a PvE battle. Success cancels the battle; failure
    /// spends the turn.
    pub fn attempt_flee(&mut self, actor_id: &str) -> Result<FleeReport, BattleError> {
        self.ensure_turn(actor_id)?;
        if self.session.battle_type != BattleType::Pve {
            return Err(BattleError::FleeNotAllowed);
        }

        let chance = self.flee_chance(actor_id);
        let success = self.roll_unit(RollKind::Flee) < chance;

        if success {
            self.session
                .push_log(LogKind::Flee, Some(actor_id), format!("{actor_id} got away safely"));
            self.session.transition(BattleStatus::Cancelled);
            self.session.outcome = Some(BattleOutcome::Fled);
            self.session.end_reason = Some("fled".to_owned());
            self.session.current_turn = None;
            self.touch();
            info!(
                target: "battle::engine",
                battle = %self.session.id,
                actor = actor_id,
                "participant fled"
            );
        } else {
            self.session
                .push_log(LogKind::Flee, Some(actor_id), format!("{actor_id} couldn't escape"));
            self.finish_action();
        }

        Ok(FleeReport {
            actor_id: actor_id.to_owned(),
            success,
            chance,
        })
    }
}
