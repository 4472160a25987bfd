//! Generic actor runtime.
//!
//! Every actor owns a bounded FIFO mailbox drained by its own Tokio task, so
//! messages to one actor are applied strictly in order while different actors
//! run independently. Callers interact through [`ActorSystem`]:
//! - `tell` enqueues and returns immediately
//! - `ask` enqueues with a oneshot reply and waits only the caller
//!
//! Snapshots are taken inside the mailbox task as ordinary envelopes, so a
//! persistence sweep never observes an actor halfway through a handler.

mod mailbox;
mod metrics;
mod system;

pub use mailbox::{ActorRef, PersistOutcome};
pub use metrics::{SystemMetrics, SystemMetricsSnapshot};
pub use system::{ActorSystem, PersistReport};

use async_trait::async_trait;

use crate::api::{ActorFailure, SnapshotError};
use crate::repository::ActorSnapshot;

/// State machine driven by messages from its mailbox.
#[async_trait]
pub trait Actor: Send + 'static {
    /// Tag stored alongside snapshots.
    const ACTOR_TYPE: &'static str;

    type Message: Send + 'static;
    type Reply: Send + 'static;

    async fn handle(&mut self, message: Self::Message) -> Self::Reply;

    /// Reply sent in place of a handler that panicked.
    fn failure_reply(failure: ActorFailure) -> Self::Reply;

    /// Whether state changed since the last successful snapshot.
    fn is_dirty(&self) -> bool {
        false
    }

    fn mark_clean(&mut self) {}

    /// Serialized state; only called while dirty.
    fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        Err(SnapshotError::Unsupported(Self::ACTOR_TYPE))
    }
}

/// Builds actors for an [`ActorSystem`].
pub trait ActorFactory: Send + Sync + 'static {
    type Actor: Actor;
    /// Parameters for a fresh actor.
    type Spec: Send;

    fn create(&self, actor_id: &str, spec: Self::Spec) -> Self::Actor;

    /// Rebuilds an actor from a stored snapshot.
    ///
    /// Implementations decide how to degrade when the payload cannot be
    /// decoded; the system always gets an actor back.
    fn restore(&self, actor_id: &str, snapshot: ActorSnapshot) -> Self::Actor;
}
