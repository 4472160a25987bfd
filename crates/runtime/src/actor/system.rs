//! Registry of running actors keyed by id.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::mailbox::{self, ActorRef, PersistOutcome};
use super::{Actor, ActorFactory, SystemMetrics, SystemMetricsSnapshot};
use crate::api::{Result, RuntimeError};
use crate::repository::{ActorSnapshot, SnapshotRepository};
use crate::workers::{PersistenceWorker, WorkerHandle};

/// Totals from one persistence pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub saved: usize,
    pub clean: usize,
    pub failed: usize,
    /// Actors that stopped or timed out before answering.
    pub unreachable: usize,
}

/// Actor runtime for one actor implementation.
pub struct ActorSystem<F: ActorFactory> {
    factory: Arc<F>,
    snapshots: Arc<dyn SnapshotRepository>,
    actors: Mutex<HashMap<String, ActorRef<F::Actor>>>,
    mailbox_capacity: usize,
    persist_timeout: Duration,
    metrics: Arc<SystemMetrics>,
}

impl<F: ActorFactory> ActorSystem<F> {
    pub fn new(
        factory: Arc<F>,
        snapshots: Arc<dyn SnapshotRepository>,
        mailbox_capacity: usize,
        persist_timeout: Duration,
    ) -> Self {
        Self {
            factory,
            snapshots,
            actors: Mutex::new(HashMap::new()),
            mailbox_capacity,
            persist_timeout,
            metrics: Arc::new(SystemMetrics::new()),
        }
    }

    pub fn factory(&self) -> &Arc<F> {
        &self.factory
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<String, ActorRef<F::Actor>>> {
        self.actors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Address of a resident actor.
    pub fn get_actor(&self, actor_id: &str) -> Option<ActorRef<F::Actor>> {
        self.registry().get(actor_id).cloned()
    }

    /// Resident actor, else one restored from its snapshot, else a fresh one
    /// built from `spec`.
    pub fn get_or_create_actor(&self, actor_id: &str, spec: F::Spec) -> ActorRef<F::Actor> {
        let mut actors = self.registry();
        if let Some(actor) = actors.get(actor_id) {
            return actor.clone();
        }

        let actor = match self.load_snapshot(actor_id) {
            Some(snapshot) => {
                self.metrics.record_restored();
                info!(target: "runtime::actor", actor_id, "Restored actor from snapshot");
                self.factory.restore(actor_id, snapshot)
            }
            None => {
                self.metrics.record_spawned();
                debug!(target: "runtime::actor", actor_id, "Created actor");
                self.factory.create(actor_id, spec)
            }
        };
        self.spawn_into(&mut actors, actor_id, actor)
    }

    /// Resident actor, else one restored from its snapshot. `None` when
    /// neither exists.
    pub fn get_or_restore_actor(&self, actor_id: &str) -> Option<ActorRef<F::Actor>> {
        let mut actors = self.registry();
        if let Some(actor) = actors.get(actor_id) {
            return Some(actor.clone());
        }

        let snapshot = self.load_snapshot(actor_id)?;
        self.metrics.record_restored();
        info!(target: "runtime::actor", actor_id, "Restored actor from snapshot");
        let actor = self.factory.restore(actor_id, snapshot);
        Some(self.spawn_into(&mut actors, actor_id, actor))
    }

    fn spawn_into(
        &self,
        actors: &mut HashMap<String, ActorRef<F::Actor>>,
        actor_id: &str,
        actor: F::Actor,
    ) -> ActorRef<F::Actor> {
        let actor_ref = mailbox::spawn(
            actor_id,
            actor,
            self.mailbox_capacity,
            self.snapshots.clone(),
            self.metrics.clone(),
        );
        actors.insert(actor_id.to_owned(), actor_ref.clone());
        actor_ref
    }

    /// Stored snapshot for `actor_id`. Store failures and snapshots of another
    /// actor type are logged and treated as missing.
    fn load_snapshot(&self, actor_id: &str) -> Option<ActorSnapshot> {
        match self.snapshots.load(actor_id) {
            Ok(Some(snapshot)) if snapshot.actor_type == F::Actor::ACTOR_TYPE => Some(snapshot),
            Ok(Some(snapshot)) => {
                warn!(
                    target: "runtime::actor",
                    actor_id,
                    found = %snapshot.actor_type,
                    expected = F::Actor::ACTOR_TYPE,
                    "Ignoring snapshot of another actor type"
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(target: "runtime::actor", actor_id, "Failed to load snapshot: {}", e);
                None
            }
        }
    }

    /// Enqueues a message without waiting for it to be handled.
    pub async fn tell(&self, actor_id: &str, message: <F::Actor as Actor>::Message) -> Result<()> {
        let actor = self
            .get_actor(actor_id)
            .ok_or_else(|| RuntimeError::ActorNotFound(actor_id.to_owned()))?;
        actor.tell(message).await
    }

    /// Sends a message and waits up to `timeout` for the reply.
    ///
    /// A timed-out message is not cancelled; it may still run later.
    pub async fn ask(
        &self,
        actor_id: &str,
        message: <F::Actor as Actor>::Message,
        timeout: Duration,
    ) -> Result<<F::Actor as Actor>::Reply> {
        let actor = self
            .get_actor(actor_id)
            .ok_or_else(|| RuntimeError::ActorNotFound(actor_id.to_owned()))?;
        actor.ask(message, timeout).await
    }

    /// Removes the actor, persists it one last time and waits for its task to
    /// exit. Returns `None` when no such actor was resident.
    pub async fn stop_actor(&self, actor_id: &str) -> Option<PersistOutcome> {
        let actor = self.registry().remove(actor_id)?;
        self.metrics.record_stopped();
        match actor.stop().await {
            Ok(outcome) => {
                debug!(target: "runtime::actor", actor_id, ?outcome, "Stopped actor");
                Some(outcome)
            }
            Err(e) => {
                warn!(target: "runtime::actor", actor_id, "Actor stopped uncleanly: {}", e);
                Some(PersistOutcome::Failed)
            }
        }
    }

    pub fn actor_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registry().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Actors with no `tell` or `ask` for at least `threshold`.
    pub fn idle_actors(&self, threshold: Duration) -> Vec<String> {
        let mut ids: Vec<String> = self
            .registry()
            .iter()
            .filter(|(_, actor)| actor.idle_for() >= threshold)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Snapshots one actor now instead of waiting for the next sweep.
    pub async fn persist_actor(&self, actor_id: &str) -> Result<PersistOutcome> {
        let actor = self
            .get_actor(actor_id)
            .ok_or_else(|| RuntimeError::ActorNotFound(actor_id.to_owned()))?;
        actor.persist(self.persist_timeout).await
    }

    /// Snapshots every dirty actor and waits for each outcome.
    pub async fn persist_all(&self) -> PersistReport {
        let actors: Vec<ActorRef<F::Actor>> = self.registry().values().cloned().collect();
        let mut report = PersistReport::default();
        for actor in actors {
            match actor.persist(self.persist_timeout).await {
                Ok(PersistOutcome::Saved) => report.saved += 1,
                Ok(PersistOutcome::Clean) => report.clean += 1,
                Ok(PersistOutcome::Failed) => report.failed += 1,
                Err(e) => {
                    debug!(
                        target: "runtime::actor",
                        actor_id = actor.id(),
                        "Persist skipped: {}",
                        e
                    );
                    report.unreachable += 1;
                }
            }
        }
        report
    }

    /// Queues a snapshot request on every mailbox without waiting. Returns how
    /// many requests were queued.
    pub fn request_persist_all(&self) -> usize {
        self.registry()
            .values()
            .filter(|actor| actor.request_persist())
            .count()
    }

    /// Starts the background sweep that snapshots dirty actors every
    /// `interval`.
    pub fn spawn_persistence_sweep(self: &Arc<Self>, interval: Duration) -> WorkerHandle {
        PersistenceWorker::spawn(self.clone(), interval)
    }

    /// Stops every actor, each with a final snapshot.
    pub async fn shutdown(&self) -> PersistReport {
        let actors: Vec<(String, ActorRef<F::Actor>)> = self.registry().drain().collect();
        let mut report = PersistReport::default();
        for (actor_id, actor) in actors {
            self.metrics.record_stopped();
            match actor.stop().await {
                Ok(PersistOutcome::Saved) => report.saved += 1,
                Ok(PersistOutcome::Clean) => report.clean += 1,
                Ok(PersistOutcome::Failed) => report.failed += 1,
                Err(e) => {
                    warn!(target: "runtime::actor", actor_id, "Actor stopped uncleanly: {}", e);
                    report.unreachable += 1;
                }
            }
        }
        info!(
            target: "runtime::actor",
            saved = report.saved,
            failed = report.failed,
            "Actor system shut down"
        );
        report
    }

    pub fn metrics(&self) -> SystemMetricsSnapshot {
        self.metrics.snapshot()
    }
}
