//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from actor messaging, repositories and snapshot codecs so
//! callers can bubble them up with consistent context. Gameplay rejections
//! are not errors at this level; they travel inside
//! [`crate::ActionResponse`].
use std::time::Duration;

use thiserror::Error;

pub use battle_cache::CacheError;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("actor {0} is not running")]
    ActorNotFound(String),

    #[error("actor {actor_id} did not reply within {timeout:?}")]
    AskTimeout { actor_id: String, timeout: Duration },

    #[error("mailbox of actor {0} is closed")]
    MailboxClosed(String),

    #[error("actor {0} dropped the reply channel")]
    ReplyDropped(String),

    #[error("battle {0} not found")]
    BattleNotFound(String),

    #[error("battle {battle_id} rejected setup: {reason}")]
    SetupRejected { battle_id: String, reason: String },

    #[error("invalid battle message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("runtime requires game data to be configured before building")]
    MissingGameData,
}

/// Failures encoding or decoding actor state.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(String),

    #[error("failed to decode snapshot: {0}")]
    Decode(String),

    #[error("snapshot belongs to actor type {found}, expected {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("snapshot for {actor_id} holds battle {found}")]
    BattleMismatch { actor_id: String, found: String },

    #[error("actor type {0} does not support snapshots")]
    Unsupported(&'static str),
}

/// Internal failure raised at the dispatch boundary and converted into a
/// failure reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActorFailure {
    #[error("handler of actor {actor_id} panicked: {message}")]
    HandlerPanicked { actor_id: String, message: String },
}
