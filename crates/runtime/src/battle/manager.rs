//! Orchestration of battle actors and their session rows.
//!
//! [`BattleManager`] is constructed explicitly through
//! [`BattleManagerBuilder`] and shared behind an `Arc`. It owns the actor
//! system, keeps the session store in step with battle lifecycles, recovers
//! unfinished battles on startup and runs the background sweeps.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use battle_cache::{CacheManager, NamedCacheStats, SweeperHandle};
use battle_core::{BattleType, ParticipantId, ParticipantStatus};
use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{
    ActionResponse, BattleFactory, BattleMessage, BattleSpec, CombatantSpec, OperationStats,
};
use crate::actor::{ActorSystem, PersistOutcome, PersistReport, SystemMetricsSnapshot};
use crate::api::{BattleHandle, BattleNotice, NoticeKind, Notifier, Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::repository::{SessionRecord, SessionRepository, SessionStatus};
use crate::utils::actor_id_for;
use crate::workers::{CleanupWorker, WorkerHandle};

/// One side's member in a new battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantSpec {
    pub id: ParticipantId,
    pub team_id: u32,
    pub is_npc: bool,
    pub status: ParticipantStatus,
    /// Roster in slot order.
    pub combatants: Vec<CombatantSpec>,
}

impl ParticipantSpec {
    /// A human participant who has already joined.
    pub fn player(id: impl Into<ParticipantId>, team_id: u32) -> Self {
        Self {
            id: id.into(),
            team_id,
            is_npc: false,
            status: ParticipantStatus::Joined,
            combatants: Vec::new(),
        }
    }

    pub fn npc(id: impl Into<ParticipantId>, team_id: u32) -> Self {
        Self {
            is_npc: true,
            ..Self::player(id, team_id)
        }
    }

    pub fn with_status(mut self, status: ParticipantStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_combatant(mut self, combatant: CombatantSpec) -> Self {
        self.combatants.push(combatant);
        self
    }
}

/// Everything needed to open a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleSetup {
    pub battle_id: String,
    pub battle_type: BattleType,
    pub host_id: Option<ParticipantId>,
    pub seed: Option<u64>,
    pub participants: Vec<ParticipantSpec>,
}

impl BattleSetup {
    pub fn new(battle_id: impl Into<String>, battle_type: BattleType) -> Self {
        Self {
            battle_id: battle_id.into(),
            battle_type,
            host_id: None,
            seed: None,
            participants: Vec::new(),
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

    pub fn with_participant(mut self, participant: ParticipantSpec) -> Self {
        self.participants.push(participant);
        self
    }
}

/// Aggregated counters for the whole manager.
#[derive(Clone, Debug)]
pub struct ManagerMetrics {
    pub active_battles: usize,
    pub actors: SystemMetricsSnapshot,
    pub operations: Vec<OperationStats>,
    pub caches: Vec<NamedCacheStats>,
}

/// How a battle left the manager.
struct Ending<'a> {
    status: SessionStatus,
    winner_id: Option<&'a str>,
    reason: &'a str,
    kind: NoticeKind,
    recipients: Vec<ParticipantId>,
}

/// Clears the recovery flag when recovery returns, including on error.
struct RecoveryGuard<'a>(&'a AtomicBool);

impl Drop for RecoveryGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct BattleManager {
    config: RuntimeConfig,
    system: Arc<ActorSystem<BattleFactory>>,
    sessions: Arc<dyn SessionRepository>,
    notifier: Arc<dyn Notifier>,
    caches: Arc<CacheManager>,
    /// Resident battles: battle id to actor id.
    battles: Mutex<HashMap<String, String>>,
    recovering: AtomicBool,
    workers: tokio::sync::Mutex<Vec<WorkerHandle>>,
    sweeper: tokio::sync::Mutex<Option<SweeperHandle>>,
}

impl BattleManager {
    pub fn builder() -> super::BattleManagerBuilder {
        super::BattleManagerBuilder::new()
    }

    pub(crate) fn new(
        config: RuntimeConfig,
        system: Arc<ActorSystem<BattleFactory>>,
        sessions: Arc<dyn SessionRepository>,
        notifier: Arc<dyn Notifier>,
        caches: Arc<CacheManager>,
    ) -> Self {
        Self {
            config,
            system,
            sessions,
            notifier,
            caches,
            battles: Mutex::new(HashMap::new()),
            recovering: AtomicBool::new(false),
            workers: tokio::sync::Mutex::new(Vec::new()),
            sweeper: tokio::sync::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn system(&self) -> &Arc<ActorSystem<BattleFactory>> {
        &self.system
    }

    pub fn caches(&self) -> &Arc<CacheManager> {
        &self.caches
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.battles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(self: &Arc<Self>, battle_id: &str, actor_id: &str) -> BattleHandle {
        BattleHandle::new(battle_id, actor_id, self.clone())
    }

    /// Recovers unfinished battles, then starts the persistence, cleanup and
    /// cache sweeps. Returns how many battles were recovered.
    pub async fn start(self: &Arc<Self>) -> Result<usize> {
        let recovered = self.recover_battles().await?;

        let mut workers = self.workers.lock().await;
        workers.push(
            self.system
                .spawn_persistence_sweep(self.config.persist_interval),
        );
        workers.push(CleanupWorker::spawn(
            self.clone(),
            self.config.cleanup_interval,
        ));
        *self.sweeper.lock().await = Some(
            self.caches
                .spawn_sweeper(self.config.cache_sweep_interval),
        );

        info!(
            target: "runtime::manager",
            recovered,
            data_dir = %self.config.data_dir.display(),
            "Battle manager started"
        );
        Ok(recovered)
    }

    /// Opens a battle and seats its participants.
    ///
    /// Returns the resident battle when `battle_id` is already open. An open
    /// battle with nobody seated, as left by a crash before its first
    /// snapshot, gets the participants of `setup`. A setup message the battle
    /// rejects cancels it and surfaces as [`RuntimeError::SetupRejected`].
    pub async fn create_battle(self: &Arc<Self>, setup: BattleSetup) -> Result<BattleHandle> {
        self.wait_for_recovery().await;

        let battle_id = setup.battle_id.clone();
        let mut reopened = self.resident_actor(&battle_id);
        if reopened.is_none() {
            match self.sessions.get(&battle_id) {
                Ok(Some(row)) if row.status.is_terminal() => {
                    return Err(RuntimeError::SetupRejected {
                        battle_id,
                        reason: format!("battle already {}", row.status.as_str()),
                    });
                }
                Ok(Some(_)) => {
                    reopened = self
                        .get_battle(&battle_id)
                        .await?
                        .map(|handle| handle.actor_id().to_owned());
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(target: "runtime::manager", battle_id, "Session lookup failed: {}", e);
                }
            }
        }

        if let Some(actor_id) = reopened {
            if self.seated(&actor_id).await? > 0 {
                return Ok(self.handle(&battle_id, &actor_id));
            }
            info!(
                target: "runtime::manager",
                battle_id,
                "Open battle has nobody seated; seating setup participants"
            );
            return self.open(setup, actor_id).await;
        }

        let actor_id = actor_id_for(&battle_id);
        let spec = BattleSpec {
            battle_id: battle_id.clone(),
            battle_type: setup.battle_type,
            host_id: setup.host_id.clone(),
            seed: setup.seed,
        };
        self.system.get_or_create_actor(&actor_id, spec);

        let row = SessionRecord::waiting(&battle_id, setup.battle_type, setup.host_id.clone());
        if let Err(e) = self.sessions.upsert(&row) {
            warn!(target: "runtime::manager", battle_id, "Failed to store session row: {}", e);
        }
        self.open(setup, actor_id).await
    }

    /// Seats `setup` into the battle at `actor_id`, snapshots it and makes it
    /// resident.
    async fn open(self: &Arc<Self>, setup: BattleSetup, actor_id: String) -> Result<BattleHandle> {
        let battle_id = setup.battle_id.clone();
        if let Err(reason) = self.seat_participants(&actor_id, &setup).await {
            warn!(target: "runtime::manager", battle_id, "Setup rejected: {}", reason);
            self.registry().remove(&battle_id);
            self.system.stop_actor(&actor_id).await;
            self.update_row(&battle_id, SessionStatus::Cancelled, None, Some("setup rejected"));
            return Err(RuntimeError::SetupRejected { battle_id, reason });
        }

        // The row is already open, so the seated roster must reach the store
        // before the caller can act on it.
        match self.system.persist_actor(&actor_id).await {
            Ok(PersistOutcome::Failed) => {
                warn!(target: "runtime::manager", battle_id, "Initial snapshot failed");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(target: "runtime::manager", battle_id, "Initial snapshot skipped: {}", e);
            }
        }

        self.registry().insert(battle_id.clone(), actor_id.clone());
        info!(
            target: "runtime::manager",
            battle_id,
            actor_id,
            battle_type = %setup.battle_type,
            participants = setup.participants.len(),
            "Battle created"
        );
        Ok(self.handle(&battle_id, &actor_id))
    }

    /// Number of participants currently seated in the battle at `actor_id`.
    async fn seated(&self, actor_id: &str) -> Result<usize> {
        let response = self
            .system
            .ask(actor_id, BattleMessage::GetBattleState, self.config.ask_timeout)
            .await?;
        Ok(response
            .state
            .map(|state| state.participants.len())
            .unwrap_or(0))
    }

    async fn seat_participants(
        &self,
        actor_id: &str,
        setup: &BattleSetup,
    ) -> std::result::Result<(), String> {
        for participant in &setup.participants {
            let add = BattleMessage::AddParticipant {
                user_id: participant.id.clone(),
                team_id: participant.team_id,
                is_host: setup.host_id.as_deref() == Some(participant.id.as_str()),
                is_npc: participant.is_npc,
                status: participant.status,
            };
            self.setup_ask(actor_id, add).await?;

            for (slot, combatant) in participant.combatants.iter().enumerate() {
                let add = BattleMessage::AddCombatant {
                    user_id: participant.id.clone(),
                    slot,
                    combatant: combatant.clone(),
                };
                self.setup_ask(actor_id, add).await?;
            }
        }
        Ok(())
    }

    async fn setup_ask(
        &self,
        actor_id: &str,
        message: BattleMessage,
    ) -> std::result::Result<(), String> {
        let response = self
            .system
            .ask(actor_id, message, self.config.ask_timeout)
            .await
            .map_err(|e| e.to_string())?;
        if response.success {
            Ok(())
        } else {
            Err(response
                .reason
                .unwrap_or_else(|| "setup message rejected".to_owned()))
        }
    }

    /// Resident battle, else one recovered from the store when its session is
    /// still open, else `None`.
    pub async fn get_battle(self: &Arc<Self>, battle_id: &str) -> Result<Option<BattleHandle>> {
        self.wait_for_recovery().await;

        if let Some(actor_id) = self.registry().get(battle_id).cloned() {
            return Ok(Some(self.handle(battle_id, &actor_id)));
        }

        let Some(row) = self.sessions.get(battle_id)? else {
            return Ok(None);
        };
        if row.status.is_terminal() {
            debug!(
                target: "runtime::manager",
                battle_id,
                status = row.status.as_str(),
                "Battle already finished"
            );
            return Ok(None);
        }

        let actor_id = self.revive(&row);
        Ok(Some(self.handle(battle_id, &actor_id)))
    }

    /// Brings the actor for `row` back, from its snapshot when one exists.
    fn revive(&self, row: &SessionRecord) -> String {
        let actor_id = actor_id_for(&row.id);
        if self.system.get_or_restore_actor(&actor_id).is_none() {
            warn!(
                target: "runtime::manager",
                battle_id = %row.id,
                "No snapshot for open session; starting it over"
            );
            let spec = BattleSpec {
                battle_id: row.id.clone(),
                battle_type: row.battle_type,
                host_id: row.host_id.clone(),
                seed: None,
            };
            self.system.get_or_create_actor(&actor_id, spec);
        }
        self.registry().insert(row.id.clone(), actor_id.clone());
        actor_id
    }

    fn resident_actor(&self, battle_id: &str) -> Option<String> {
        self.registry().get(battle_id).cloned()
    }

    async fn resolve(self: &Arc<Self>, battle_id: &str) -> Result<String> {
        if let Some(actor_id) = self.resident_actor(battle_id) {
            return Ok(actor_id);
        }
        self.get_battle(battle_id)
            .await?
            .map(|handle| handle.actor_id().to_owned())
            .ok_or_else(|| {
                warn!(target: "runtime::manager", battle_id, "Battle not found");
                RuntimeError::BattleNotFound(battle_id.to_owned())
            })
    }

    /// Delivers `message` to the battle and keeps its session row in step.
    ///
    /// A message that ends the battle also stops its actor and evicts it.
    pub async fn send(
        self: &Arc<Self>,
        battle_id: &str,
        message: BattleMessage,
    ) -> Result<ActionResponse> {
        let actor_id = self.resolve(battle_id).await?;
        let response = self
            .system
            .ask(&actor_id, message, self.config.ask_timeout)
            .await
            .map_err(|e| match e {
                RuntimeError::ActorNotFound(_) => {
                    RuntimeError::BattleNotFound(battle_id.to_owned())
                }
                other => other,
            })?;

        if response.started.is_some() {
            self.update_row(battle_id, SessionStatus::Active, None, None);
        }
        if let Some(ended) = &response.ended {
            let reason = ended
                .outcome
                .map(|outcome| outcome.to_string())
                .unwrap_or_else(|| "ended".to_owned());
            let ending = Ending {
                status: SessionStatus::from(ended.status),
                winner_id: ended.winner_id.as_deref(),
                reason: &reason,
                kind: NoticeKind::Ended,
                recipients: recipients(&response),
            };
            self.finalize(battle_id, &actor_id, ending).await;
        }
        Ok(response)
    }

    /// Force-ends a battle: the actor finalizes, takes a last snapshot and is
    /// evicted, and the session row becomes terminal.
    pub async fn end_battle(
        self: &Arc<Self>,
        battle_id: &str,
        reason: &str,
        winner_id: Option<&str>,
    ) -> Result<ActionResponse> {
        let actor_id = self.resolve(battle_id).await?;
        let message = BattleMessage::EndBattle {
            reason: Some(reason.to_owned()),
            winner_id: winner_id.map(str::to_owned),
        };
        let response = self
            .system
            .ask(&actor_id, message, self.config.ask_timeout)
            .await?;

        if response.success {
            let ending = Ending {
                status: response
                    .status
                    .map(SessionStatus::from)
                    .unwrap_or(SessionStatus::Cancelled),
                winner_id,
                reason,
                kind: NoticeKind::Ended,
                recipients: recipients(&response),
            };
            self.finalize(battle_id, &actor_id, ending).await;
        }
        Ok(response)
    }

    async fn finalize(&self, battle_id: &str, actor_id: &str, ending: Ending<'_>) {
        let Ending {
            status,
            winner_id,
            reason,
            kind,
            recipients,
        } = ending;

        let outcome = self.system.stop_actor(actor_id).await;
        self.registry().remove(battle_id);
        self.update_row(battle_id, status, winner_id, Some(reason));

        let message = format!("battle {}: {}", status.as_str(), reason);
        let notice = BattleNotice::new(battle_id, kind, message).with_recipients(recipients);
        let delivered = self.notifier.notify(&notice);

        info!(
            target: "runtime::manager",
            battle_id,
            status = status.as_str(),
            winner = winner_id.unwrap_or("-"),
            reason,
            ?outcome,
            delivered,
            "Battle finalized"
        );
    }

    fn update_row(
        &self,
        battle_id: &str,
        status: SessionStatus,
        winner_id: Option<&str>,
        end_reason: Option<&str>,
    ) {
        match self
            .sessions
            .update_status(battle_id, status, winner_id, end_reason, Utc::now())
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(target: "runtime::manager", battle_id, "No session row to update");
            }
            Err(e) => {
                warn!(
                    target: "runtime::manager",
                    battle_id,
                    status = status.as_str(),
                    "Failed to update session row: {}",
                    e
                );
            }
        }
    }

    /// Recreates actors for open sessions inside the recovery window.
    ///
    /// While this runs, `create_battle` and `get_battle` wait up to
    /// `recovery_wait` for it to finish.
    pub async fn recover_battles(&self) -> Result<usize> {
        self.recovering.store(true, Ordering::Release);
        let _guard = RecoveryGuard(&self.recovering);

        let rows = self.sessions.list_recoverable(self.recovery_cutoff())?;
        let mut recovered = 0;
        for row in rows {
            if self.resident_actor(&row.id).is_some() {
                continue;
            }
            self.revive(&row);
            recovered += 1;

            let notice = BattleNotice::new(&row.id, NoticeKind::Recovered, "battle resumed")
                .with_recipients(row.host_id.iter().cloned().collect());
            self.notifier.notify(&notice);
            debug!(
                target: "runtime::manager",
                battle_id = %row.id,
                status = row.status.as_str(),
                "Recovered battle"
            );
        }

        if recovered > 0 {
            info!(target: "runtime::manager", recovered, "Recovered open battles");
        }
        Ok(recovered)
    }

    fn recovery_cutoff(&self) -> DateTime<Utc> {
        let window =
            TimeDelta::from_std(self.config.recovery_window).unwrap_or(TimeDelta::hours(24));
        Utc::now() - window
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering.load(Ordering::Acquire)
    }

    async fn wait_for_recovery(&self) {
        if !self.is_recovering() {
            return;
        }
        let deadline = Instant::now() + self.config.recovery_wait;
        while self.is_recovering() {
            if Instant::now() >= deadline {
                warn!(
                    target: "runtime::manager",
                    wait = ?self.config.recovery_wait,
                    "Recovery still running; proceeding"
                );
                return;
            }
            tokio::time::sleep(self.config.recovery_poll).await;
        }
    }

    /// Force-ends and evicts every battle idle longer than `idle_timeout`.
    /// Returns how many were reaped.
    pub async fn cleanup_idle(&self) -> usize {
        let idle = self.system.idle_actors(self.config.idle_timeout);
        if idle.is_empty() {
            return 0;
        }

        let battles: Vec<(String, String)> = self
            .registry()
            .iter()
            .filter(|(_, actor_id)| idle.contains(*actor_id))
            .map(|(battle_id, actor_id)| (battle_id.clone(), actor_id.clone()))
            .collect();

        let mut reaped = 0;
        for (battle_id, actor_id) in battles {
            let message = BattleMessage::EndBattle {
                reason: Some("expired".to_owned()),
                winner_id: None,
            };
            let recipients = match self
                .system
                .ask(&actor_id, message, self.config.ask_timeout)
                .await
            {
                Ok(response) => recipients(&response),
                Err(e) => {
                    warn!(
                        target: "runtime::manager",
                        battle_id,
                        "Idle battle did not answer: {}",
                        e
                    );
                    Vec::new()
                }
            };
            let ending = Ending {
                status: SessionStatus::Expired,
                winner_id: None,
                reason: "idle timeout",
                kind: NoticeKind::Expired,
                recipients,
            };
            self.finalize(&battle_id, &actor_id, ending).await;
            reaped += 1;
        }

        info!(target: "runtime::manager", reaped, "Idle sweep finished");
        reaped
    }

    /// Ids of resident battles, sorted.
    pub fn active_battles(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registry().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Snapshots every dirty battle now.
    pub async fn persist_all(&self) -> PersistReport {
        self.system.persist_all().await
    }

    pub fn metrics(&self) -> ManagerMetrics {
        ManagerMetrics {
            active_battles: self.registry().len(),
            actors: self.system.metrics(),
            operations: self.system.factory().metrics().snapshot(),
            caches: self.caches.stats(),
        }
    }

    /// Stops the sweeps and every actor, each with a final snapshot.
    ///
    /// Session rows keep their status so the battles are recovered on the
    /// next start.
    pub async fn shutdown(&self) -> PersistReport {
        let workers: Vec<WorkerHandle> = self.workers.lock().await.drain(..).collect();
        for worker in workers {
            debug!(target: "runtime::manager", worker = worker.name(), "Stopping worker");
            worker.stop().await;
        }
        if let Some(sweeper) = self.sweeper.lock().await.take() {
            sweeper.stop().await;
        }

        let report = self.system.shutdown().await;
        self.registry().clear();
        info!(
            target: "runtime::manager",
            saved = report.saved,
            failed = report.failed,
            "Battle manager shut down"
        );
        report
    }
}

/// Human participants listed in the response's state view.
fn recipients(response: &ActionResponse) -> Vec<ParticipantId> {
    response
        .state
        .as_ref()
        .map(|state| {
            state
                .participants
                .iter()
                .filter(|p| !p.is_npc)
                .map(|p| p.id.clone())
                .collect()
        })
        .unwrap_or_default()
}
