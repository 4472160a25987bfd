//! Public runtime API surface.
//!
//! Gathers the types exposed to consumers of the runtime crate so the actor,
//! battle and worker layers can stay focused on orchestration.

pub mod errors;
pub mod handle;
pub mod notifier;

pub use errors::{ActorFailure, CacheError, RepositoryError, Result, RuntimeError, SnapshotError};
pub use handle::BattleHandle;
pub use notifier::{BattleNotice, NoticeKind, Notifier, PushNotifier, ReplyNotifier};
