//! Actor runtime hosting creature battles.
//!
//! Every battle runs inside its own actor: a Tokio task draining a bounded
//! mailbox, so messages to one battle apply strictly in order while battles
//! progress independently. [`BattleManager`] creates, recovers, ends and reaps
//! battles and keeps the session store in step; [`BattleHandle`] is the
//! cloneable façade presentation code talks to.
//!
//! Modules are organized by responsibility:
//! - [`actor`] is the generic mailbox runtime (ask/tell, snapshots, panics)
//! - [`battle`] hosts the battle actor, its messages and the manager
//! - [`api`] exposes errors, the handle and the notifier seam
//! - [`oracle`] puts read-through caches in front of static game data
//! - [`repository`] stores session rows and actor snapshots
//! - `workers` keeps the background sweeps internal to the crate
pub mod actor;
pub mod api;
pub mod battle;
pub mod config;
pub mod oracle;
pub mod repository;

mod utils;
mod workers;

pub use actor::{Actor, ActorFactory, ActorRef, ActorSystem, PersistOutcome, PersistReport};
pub use api::{
    ActorFailure, BattleHandle, BattleNotice, NoticeKind, Notifier, PushNotifier, ReplyNotifier,
    Result, RuntimeError, SnapshotError,
};
pub use battle::{
    ActionResponse, BattleActor, BattleFactory, BattleManager, BattleManagerBuilder,
    BattleMessage, BattleSetup, BattleSpec, CombatantSpec, FailureKind, ManagerMetrics,
    Operation, ParticipantSpec,
};
pub use config::RuntimeConfig;
pub use oracle::CachedGameData;
pub use repository::{
    ActorSnapshot, FileSessionRepository, FileSnapshotRepository, InMemorySessionRepository,
    InMemorySnapshotRepository, RepositoryError, SessionRecord, SessionRepository, SessionStatus,
    SnapshotRepository,
};
pub use utils::actor_id_for;
pub use workers::WorkerHandle;
