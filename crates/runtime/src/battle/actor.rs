//! Actor wrapping one [`BattleEngine`].
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use battle_core::{
    ActionOutcome, BattleConfig, BattleEngine, BattleError, BattleSession, BattleType, Combatant,
    EndReport, GameDataOracle, ParticipantFlags, ParticipantId, TurnAction,
};
use chrono::Utc;
use tracing::{debug, warn};

use super::{
    ActionResponse, BattleMessage, BattleMetrics, BattleSnapshot, CombatantSpec, FailureKind,
};
use crate::actor::{Actor, ActorFactory};
use crate::api::{ActorFailure, SnapshotError};
use crate::repository::ActorSnapshot;
use crate::utils::actor_id_for;

/// Upper bound on NPC turns played in reply to one message.
const MAX_NPC_TURNS: usize = 64;

/// Parameters for a fresh battle actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleSpec {
    pub battle_id: String,
    pub battle_type: BattleType,
    pub host_id: Option<ParticipantId>,
    /// Seed for the engine's rolls; random when `None`.
    pub seed: Option<u64>,
}

impl BattleSpec {
    pub fn new(battle_id: impl Into<String>, battle_type: BattleType) -> Self {
        Self {
            battle_id: battle_id.into(),
            battle_type,
            host_id: None,
            seed: None,
        }
    }

    pub fn with_host(mut self, host_id: impl Into<ParticipantId>) -> Self {
        self.host_id = Some(host_id.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

pub struct BattleActor {
    actor_id: String,
    battle_id: String,
    battle_type: BattleType,
    host_id: Option<ParticipantId>,
    engine: BattleEngine,
    dirty: bool,
    last_activity: i64,
    metrics: Arc<BattleMetrics>,
}

impl BattleActor {
    pub fn battle_id(&self) -> &str {
        &self.battle_id
    }

    pub fn engine(&self) -> &BattleEngine {
        &self.engine
    }

    fn dispatch(&mut self, message: BattleMessage) -> ActionResponse {
        let status = self.engine.session().status;
        match message {
            BattleMessage::StartBattle { user_id } => {
                if let (Some(user), Some(host)) = (user_id.as_deref(), self.host_id.as_deref())
                    && user != host
                {
                    return ActionResponse::rejected(
                        status,
                        FailureKind::Validation,
                        format!("only the host {host} can start the battle"),
                    );
                }
                match self.engine.start_battle() {
                    Ok(report) => {
                        // NPCs that move first act right away.
                        let mut outcomes = Vec::new();
                        self.play_npc_turns(&mut outcomes);
                        let mut response = ActionResponse::ok(self.engine.session().status);
                        response.started = Some(report);
                        response.outcomes = outcomes;
                        response
                    }
                    Err(e) => ActionResponse::from_error(status, &e),
                }
            }
            BattleMessage::ExecuteMove {
                user_id,
                move_name,
                target_ids,
            } => {
                let result = self
                    .engine
                    .execute_move(&user_id, &move_name, &target_ids)
                    .map(ActionOutcome::Move);
                self.respond(result)
            }
            BattleMessage::SwitchVeramon {
                user_id,
                veramon_id,
            } => {
                let result = self
                    .engine
                    .switch_combatant(&user_id, veramon_id)
                    .map(ActionOutcome::Switch);
                self.respond(result)
            }
            BattleMessage::UseItem {
                user_id,
                item_id,
                target_id,
            } => {
                let result = self
                    .engine
                    .use_item(&user_id, &item_id, target_id.as_deref())
                    .map(ActionOutcome::Item);
                self.respond(result)
            }
            BattleMessage::AttemptFlee { user_id } => {
                let result = self.engine.attempt_flee(&user_id).map(ActionOutcome::Flee);
                self.respond(result)
            }
            BattleMessage::ProcessTurn { user_id, turn } => self.process_turn(user_id, turn),
            BattleMessage::EndBattle { reason, winner_id } => {
                let reason = reason.as_deref().unwrap_or("ended");
                match self.engine.end_battle(reason, winner_id.as_deref()) {
                    Ok(_) => ActionResponse::ok(self.engine.session().status),
                    Err(e) => ActionResponse::from_error(status, &e),
                }
            }
            BattleMessage::GetBattleState => ActionResponse::ok(status),
            BattleMessage::AddParticipant {
                user_id,
                team_id,
                is_host,
                is_npc,
                status: participant_status,
            } => {
                let flags = ParticipantFlags {
                    host: is_host,
                    npc: is_npc,
                };
                match self
                    .engine
                    .add_participant(&user_id, team_id, flags, participant_status)
                {
                    Ok(()) => ActionResponse::ok(status),
                    Err(e) => ActionResponse::from_error(status, &e),
                }
            }
            BattleMessage::AddCombatant {
                user_id,
                slot,
                combatant,
            } => match self.build_combatant(&combatant) {
                Ok(built) => match self.engine.add_combatant(&user_id, built, slot) {
                    Ok(()) => ActionResponse::ok(status),
                    Err(e) => ActionResponse::from_error(status, &e),
                },
                Err(reason) => ActionResponse::rejected(status, FailureKind::NotFound, reason),
            },
            BattleMessage::SetParticipantStatus {
                user_id,
                status: participant_status,
            } => match self
                .engine
                .set_participant_status(&user_id, participant_status)
            {
                Ok(_) => ActionResponse::ok(self.engine.session().status),
                Err(e) => ActionResponse::from_error(status, &e),
            },
        }
    }

    fn respond(&self, result: Result<ActionOutcome, BattleError>) -> ActionResponse {
        let status = self.engine.session().status;
        match result {
            Ok(outcome) => {
                let mut response = ActionResponse::ok(status);
                response.outcomes.push(outcome);
                response
            }
            Err(e) => ActionResponse::from_error(status, &e),
        }
    }

    fn process_turn(
        &mut self,
        user_id: Option<ParticipantId>,
        turn: Option<TurnAction>,
    ) -> ActionResponse {
        let status = self.engine.session().status;
        let mut outcomes = Vec::new();

        if let Some(turn) = turn {
            let Some(user_id) = user_id else {
                return ActionResponse::rejected(
                    status,
                    FailureKind::Validation,
                    "a turn action needs a user_id",
                );
            };
            match self.engine.process_action(&user_id, &turn) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => return ActionResponse::from_error(status, &e),
            }
        }

        self.play_npc_turns(&mut outcomes);

        let mut response = ActionResponse::ok(self.engine.session().status);
        response.outcomes = outcomes;
        response
    }

    /// Plays NPC turns until a human is up or the battle stops.
    fn play_npc_turns(&mut self, outcomes: &mut Vec<ActionOutcome>) {
        for _ in 0..MAX_NPC_TURNS {
            let session = self.engine.session();
            if !session.is_active() {
                return;
            }
            let Some(current) = session.current_turn.clone() else {
                return;
            };
            if !session.participant(&current).is_some_and(|p| p.is_npc) {
                return;
            }

            let Some(action) = self.engine.choose_npc_action(&current) else {
                warn!(
                    target: "runtime::battle",
                    battle_id = %self.battle_id,
                    npc = %current,
                    "NPC has no usable action"
                );
                return;
            };
            match self.engine.process_action(&current, &action) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(
                        target: "runtime::battle",
                        battle_id = %self.battle_id,
                        npc = %current,
                        action = action.as_str(),
                        "NPC action rejected: {}",
                        e
                    );
                    return;
                }
            }
        }
        warn!(
            target: "runtime::battle",
            battle_id = %self.battle_id,
            "Stopped after {} consecutive NPC turns",
            MAX_NPC_TURNS
        );
    }

    fn build_combatant(&self, spec: &CombatantSpec) -> Result<Combatant, String> {
        let data = self.engine.data();
        let template = data
            .species(&spec.species)
            .ok_or_else(|| format!("species {} is not defined", spec.species))?;
        let mut combatant = Combatant::from_template(&template, spec.level);
        if let Some(nickname) = &spec.nickname {
            combatant = combatant.with_nickname(nickname.clone());
        }
        if let Some(form) = &spec.form {
            if data.form(&spec.species, form).is_none() {
                return Err(format!("{} has no form {}", spec.species, form));
            }
            combatant = combatant.with_form(form.clone());
        }
        Ok(combatant)
    }

    fn to_snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            battle_id: self.battle_id.clone(),
            battle_type: self.battle_type,
            host_id: self.host_id.clone(),
            session: self.engine.session().clone(),
            last_activity: self.last_activity,
        }
    }
}

#[async_trait]
impl Actor for BattleActor {
    const ACTOR_TYPE: &'static str = "battle";

    type Message = BattleMessage;
    type Reply = ActionResponse;

    async fn handle(&mut self, message: BattleMessage) -> ActionResponse {
        let operation = message.operation();
        let started = Instant::now();
        let now = Utc::now().timestamp();
        let was_terminal = self.engine.session().status.is_terminal();

        self.engine.set_time(now);
        self.last_activity = now;

        let mut response = self.dispatch(message);

        if response.success {
            if operation.mutates() {
                self.dirty = true;
            }
            if !was_terminal {
                response.ended = EndReport::from_session(self.engine.session());
            }
            response = response.with_state(self.engine.state_view());
        }

        let elapsed = started.elapsed();
        self.metrics.record(operation, elapsed, response.success);
        debug!(
            target: "runtime::battle",
            battle_id = %self.battle_id,
            operation = operation.as_str(),
            success = response.success,
            ?elapsed,
            "Handled message"
        );
        if let Some(reason) = &response.reason {
            debug!(target: "runtime::battle", battle_id = %self.battle_id, "Rejected: {}", reason);
        }

        response
    }

    fn failure_reply(failure: ActorFailure) -> ActionResponse {
        ActionResponse::internal(&failure)
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        self.to_snapshot().encode()
    }
}

/// Builds [`BattleActor`]s sharing game data, rules and metrics.
pub struct BattleFactory {
    data: Arc<dyn GameDataOracle>,
    config: BattleConfig,
    metrics: Arc<BattleMetrics>,
}

impl BattleFactory {
    pub fn new(data: Arc<dyn GameDataOracle>) -> Self {
        Self {
            data,
            config: BattleConfig::default(),
            metrics: Arc::new(BattleMetrics::new()),
        }
    }

    pub fn with_config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn metrics(&self) -> &Arc<BattleMetrics> {
        &self.metrics
    }

    fn actor(&self, actor_id: &str, snapshot: BattleSnapshot, dirty: bool) -> BattleActor {
        let engine = BattleEngine::new(snapshot.session, self.data.clone())
            .with_config(self.config.clone());
        BattleActor {
            actor_id: actor_id.to_owned(),
            battle_id: snapshot.battle_id,
            battle_type: snapshot.battle_type,
            host_id: snapshot.host_id,
            engine,
            dirty,
            last_activity: snapshot.last_activity,
            metrics: self.metrics.clone(),
        }
    }

    fn decode(actor_id: &str, snapshot: &ActorSnapshot) -> Result<BattleSnapshot, SnapshotError> {
        if snapshot.actor_type != BattleActor::ACTOR_TYPE {
            return Err(SnapshotError::TypeMismatch {
                expected: BattleActor::ACTOR_TYPE,
                found: snapshot.actor_type.clone(),
            });
        }
        let decoded = BattleSnapshot::decode(&snapshot.state)?;
        if actor_id_for(&decoded.battle_id) != actor_id || decoded.session.id != decoded.battle_id
        {
            return Err(SnapshotError::BattleMismatch {
                actor_id: actor_id.to_owned(),
                found: decoded.battle_id,
            });
        }
        Ok(decoded)
    }
}

impl ActorFactory for BattleFactory {
    type Actor = BattleActor;
    type Spec = BattleSpec;

    fn create(&self, actor_id: &str, spec: BattleSpec) -> BattleActor {
        let now = Utc::now().timestamp();
        let seed = spec.seed.unwrap_or_else(rand::random);
        let session = BattleSession::new(spec.battle_id.clone(), spec.battle_type, seed, now);
        let snapshot = BattleSnapshot {
            battle_id: spec.battle_id,
            battle_type: spec.battle_type,
            host_id: spec.host_id,
            session,
            last_activity: now,
        };
        // Fresh battles are persisted on the next sweep.
        self.actor(actor_id, snapshot, true)
    }

    fn restore(&self, actor_id: &str, snapshot: ActorSnapshot) -> BattleActor {
        match Self::decode(actor_id, &snapshot) {
            Ok(decoded) => {
                debug!(
                    target: "runtime::battle",
                    actor_id,
                    battle_id = %decoded.battle_id,
                    status = %decoded.session.status,
                    "Rehydrated battle"
                );
                self.actor(actor_id, decoded, false)
            }
            Err(e) => {
                warn!(
                    target: "runtime::battle",
                    actor_id,
                    "Snapshot unusable, starting an empty battle: {}",
                    e
                );
                let now = Utc::now().timestamp();
                let session = BattleSession::new(actor_id, BattleType::default(), rand::random(), now);
                let fallback = BattleSnapshot {
                    battle_id: actor_id.to_owned(),
                    battle_type: BattleType::default(),
                    host_id: None,
                    session,
                    last_activity: now,
                };
                self.actor(actor_id, fallback, true)
            }
        }
    }
}

impl std::fmt::Debug for BattleActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleActor")
            .field("actor_id", &self.actor_id)
            .field("battle_id", &self.battle_id)
            .field("status", &self.engine.session().status)
            .field("dirty", &self.dirty)
            .finish()
    }
}
