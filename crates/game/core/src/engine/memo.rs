use std::collections::HashMap;

use crate::env::ElementType;
use crate::state::ParticipantId;

/// Per-attacker cache of type-effectiveness lookups.
///
/// Keyed by `(move element, target participant, target slot)`. The attacker's
/// entries are dropped when it switches combatant.
#[derive(Clone, Debug, Default)]
pub struct EffectivenessMemo {
    entries: HashMap<ParticipantId, HashMap<(ElementType, ParticipantId, usize), f64>>,
}

impl EffectivenessMemo {
    pub fn get(
        &self,
        attacker: &str,
        element: ElementType,
        target: &str,
        slot: usize,
    ) -> Option<f64> {
        self.entries
            .get(attacker)?
            .get(&(element, target.to_owned(), slot))
            .copied()
    }

    pub fn insert(
        &mut self,
        attacker: &str,
        element: ElementType,
        target: &str,
        slot: usize,
        value: f64,
    ) {
        self.entries
            .entry(attacker.to_owned())
            .or_default()
            .insert((element, target.to_owned(), slot), value);
    }

    pub fn clear_actor(&mut self, attacker: &str) {
        self.entries.remove(attacker);
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
