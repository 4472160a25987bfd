//! Battle rules and turn resolution.
//!
//! The [`BattleEngine`] is the authoritative reducer for [`BattleSession`].
//! Every operation validates the whole request before touching the session,
//! so a failed call leaves the state exactly as it was. Random rolls draw from
//! a deterministic generator keyed by the session seed and nonce.

mod action;
mod damage;
mod errors;
mod flee;
mod items;
mod memo;
mod moves;
mod npc;
mod outcome;
mod report;
mod setup;
mod switch;
mod turns;

pub use action::TurnAction;
pub use damage::{DamageInput, calculate_damage, random_factor};
pub use errors::{BattleError, ErrorKind};
pub use memo::EffectivenessMemo;
pub use report::{
    ActionOutcome, EndReport, FleeReport, HitReport, ItemReport, MoveReport, Replacement,
    StageReport, StartReport, SwitchReport,
};

use std::sync::Arc;

use crate::config::BattleConfig;
use crate::env::{GameDataOracle, PcgRng, RngOracle, RollKind, compute_seed};
use crate::state::{BattleSession, BattleStateView, Combatant, StatKind, Timestamp};

/// Engine owning one battle session.
pub struct BattleEngine {
    session: BattleSession,
    data: Arc<dyn GameDataOracle>,
    config: BattleConfig,
    rng: PcgRng,
    memo: EffectivenessMemo,
    now: Timestamp,
}

impl BattleEngine {
    pub fn new(session: BattleSession, data: Arc<dyn GameDataOracle>) -> Self {
        let now = session.updated_at;
        Self {
            session,
            data,
            config: BattleConfig::default(),
            rng: PcgRng,
            memo: EffectivenessMemo::default(),
            now,
        }
    }

    pub fn with_config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    pub fn into_session(self) -> BattleSession {
        self.session
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn data(&self) -> &Arc<dyn GameDataOracle> {
        &self.data
    }

    /// Sets the wall-clock time stamped onto subsequent mutations.
    pub fn set_time(&mut self, now: Timestamp) {
        self.now = now;
    }

    pub fn state_view(&self) -> BattleStateView {
        BattleStateView::from_session(&self.session)
    }

    pub fn memo(&self) -> &EffectivenessMemo {
        &self.memo
    }

    fn touch(&mut self) {
        self.session.updated_at = self.now;
    }

    fn roll_d100(&mut self, kind: RollKind) -> u32 {
        let nonce = self.session.next_nonce();
        self.rng
            .roll_d100(compute_seed(self.session.seed, nonce, kind))
    }

    fn roll_unit(&mut self, kind: RollKind) -> f64 {
        let nonce = self.session.next_nonce();
        self.rng.unit(compute_seed(self.session.seed, nonce, kind))
    }

    fn ensure_active(&self) -> Result<(), BattleError> {
        if self.session.is_active() {
            Ok(())
        } else {
            Err(BattleError::NotActive(self.session.status))
        }
    }

    fn ensure_turn(&self, actor_id: &str) -> Result<(), BattleError> {
        self.ensure_active()?;
        match self.session.current_turn.as_deref() {
            Some(current) if current == actor_id => Ok(()),
            current => Err(BattleError::not_your_turn(actor_id, current)),
        }
    }

    /// Stat after form multiplier and stage modifier.
    fn effective_stat(&self, combatant: &Combatant, stat: StatKind) -> f64 {
        let form = combatant
            .form
            .as_deref()
            .and_then(|form| self.data.form(&combatant.species, form))
            .map_or(1.0, |form| form.multipliers.get(stat));
        f64::from(combatant.stats.get(stat)) * form * combatant.stages.multiplier(stat)
    }

    /// Wraps up a turn action: win check, then turn advance if still running.
    fn finish_action(&mut self) -> Option<EndReport> {
        self.touch();
        if let Some(end) = self.check_winner() {
            return Some(end);
        }
        self.advance_turn()
    }
}
