use tracing::debug;

use crate::config::BattleConfig;
use crate::state::LogKind;

use super::{BattleEngine, BattleError, SwitchReport};

impl BattleEngine {
    /// Swaps the actor's active combatant for the one in `slot`.
    ///
    /// The outgoing combatant loses its stat stages and the actor's
    /// effectiveness memo is dropped.
    pub fn switch_combatant(
        &mut self,
        actor_id: &str,
        slot: usize,
    ) -> Result<SwitchReport, BattleError> {
        self.ensure_turn(actor_id)?;
        if slot >= BattleConfig::MAX_SLOTS {
            return Err(BattleError::SlotOutOfRange {
                slot,
                max: BattleConfig::MAX_SLOTS - 1,
            });
        }
        let incoming = self
            .session
            .combatant(actor_id, slot)
            .ok_or(BattleError::EmptySlot(slot))?;
        let from_slot = self.session.active_slot(actor_id);
        if from_slot == Some(slot) {
            return Err(BattleError::SlotAlreadyActive(slot));
        }
        if !incoming.is_alive() {
            return Err(BattleError::FaintedCombatant(slot));
        }
        let name = incoming.display_name().to_owned();

        if let Some(outgoing) = self.session.active_combatant_mut(actor_id) {
            outgoing.stages.reset();
        }
        self.session.active_slots.insert(actor_id.to_owned(), slot);
        self.memo.clear_actor(actor_id);
        self.session
            .push_log(LogKind::Switch, Some(actor_id), format!("{actor_id} switched to {name}"));

        debug!(
            target: "battle::engine",
            battle = %self.session.id,
            actor = actor_id,
            from = ?from_slot,
            to = slot,
            "combatant switched"
        );
        self.finish_action();

        Ok(SwitchReport {
            actor_id: actor_id.to_owned(),
            from_slot,
            to_slot: slot,
        })
    }
}
