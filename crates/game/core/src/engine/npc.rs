use super::{BattleEngine, TurnAction};

impl BattleEngine {
    /// Picks an action for an NPC participant.
    ///
    /// Chooses the known move with the highest `power * effectiveness`
    /// against the first opposing active combatant; the earliest known move
    /// wins ties. Returns `None` when the NPC has nothing usable.
    pub fn choose_npc_action(&self, participant_id: &str) -> Option<TurnAction> {
        let combatant = self
            .session
            .active_combatant(participant_id)
            .filter(|c| c.is_alive())?;
        let target = self
            .session
            .opponents_of(participant_id)
            .into_iter()
            .find_map(|id| {
                self.session
                    .active_combatant(&id)
                    .filter(|c| c.is_alive())
                    .map(|c| (id, c.types.clone()))
            })?;

        let mut best: Option<(&str, f64)> = None;
        for name in &combatant.moves {
            let Some(definition) = self.data.move_definition(name) else {
                continue;
            };
            let effectiveness = self
                .data
                .effectiveness_against(definition.element, &target.1);
            let score = f64::from(definition.power) * effectiveness;
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((name.as_str(), score));
            }
        }

        best.map(|(name, _)| TurnAction::Move {
            move_name: name.to_owned(),
            target_ids: vec![target.0],
        })
    }
}
