//! Battles hosted as actors.
//!
//! Each battle is a [`BattleActor`] owning one engine. [`BattleManager`] maps
//! battle ids to actors and keeps the session store in step.
mod actor;
mod builder;
mod manager;
mod message;
mod metrics;
mod snapshot;

pub use actor::{BattleActor, BattleFactory, BattleSpec};
pub use builder::BattleManagerBuilder;
pub use manager::{BattleManager, BattleSetup, ManagerMetrics, ParticipantSpec};
pub use message::{ActionResponse, BattleMessage, CombatantSpec, FailureKind, Operation};
pub use metrics::{BattleMetrics, OperationStats};
pub use snapshot::BattleSnapshot;
