//! Mailbox task and the handle used to reach it.
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use super::{Actor, SystemMetrics};
use crate::api::{ActorFailure, Result, RuntimeError};
use crate::repository::{ActorSnapshot, SnapshotRepository};

/// Result of asking an actor to snapshot itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Nothing changed since the last snapshot.
    Clean,
    Saved,
    Failed,
}

pub(crate) enum Envelope<A: Actor> {
    Tell(A::Message),
    Ask {
        message: A::Message,
        reply: oneshot::Sender<A::Reply>,
    },
    Persist {
        reply: Option<oneshot::Sender<PersistOutcome>>,
    },
    /// Final snapshot, then the task exits.
    Stop {
        reply: oneshot::Sender<PersistOutcome>,
    },
}

/// Cloneable address of a running actor.
pub struct ActorRef<A: Actor> {
    id: Arc<str>,
    sender: mpsc::Sender<Envelope<A>>,
    last_activity: Arc<Mutex<Instant>>,
    metrics: Arc<SystemMetrics>,
}

impl<A: Actor> Clone for ActorRef<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            sender: self.sender.clone(),
            last_activity: self.last_activity.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<A: Actor> ActorRef<A> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Enqueues `message` without waiting for it to be handled.
    pub async fn tell(&self, message: A::Message) -> Result<()> {
        self.touch();
        self.metrics.record_tell();
        self.sender
            .send(Envelope::Tell(message))
            .await
            .map_err(|_| RuntimeError::MailboxClosed(self.id.to_string()))
    }

    /// Enqueues `message` and waits up to `timeout` for the reply.
    ///
    /// On timeout the message stays queued and may still run; its reply is
    /// discarded.
    pub async fn ask(&self, message: A::Message, timeout: Duration) -> Result<A::Reply> {
        self.touch();
        self.metrics.record_ask();

        let (reply_tx, reply_rx) = oneshot::channel();
        let exchange = async {
            self.sender
                .send(Envelope::Ask {
                    message,
                    reply: reply_tx,
                })
                .await
                .map_err(|_| RuntimeError::MailboxClosed(self.id.to_string()))?;
            reply_rx
                .await
                .map_err(|_| RuntimeError::ReplyDropped(self.id.to_string()))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                self.metrics.record_ask_timeout();
                warn!(
                    target: "runtime::actor",
                    actor_id = %self.id,
                    ?timeout,
                    "Ask timed out"
                );
                Err(RuntimeError::AskTimeout {
                    actor_id: self.id.to_string(),
                    timeout,
                })
            }
        }
    }

    /// Requests a snapshot and waits up to `timeout` for the outcome.
    pub(crate) async fn persist(&self, timeout: Duration) -> Result<PersistOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let exchange = async {
            self.sender
                .send(Envelope::Persist {
                    reply: Some(reply_tx),
                })
                .await
                .map_err(|_| RuntimeError::MailboxClosed(self.id.to_string()))?;
            reply_rx
                .await
                .map_err(|_| RuntimeError::ReplyDropped(self.id.to_string()))
        };
        tokio::time::timeout(timeout, exchange)
            .await
            .unwrap_or_else(|_| {
                Err(RuntimeError::AskTimeout {
                    actor_id: self.id.to_string(),
                    timeout,
                })
            })
    }

    /// Requests a snapshot without waiting. Skipped when the mailbox is full.
    pub(crate) fn request_persist(&self) -> bool {
        self.sender
            .try_send(Envelope::Persist { reply: None })
            .is_ok()
    }

    /// Final snapshot, then stop. Returns once the task has exited.
    pub(crate) async fn stop(&self) -> Result<PersistOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(Envelope::Stop { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::MailboxClosed(self.id.to_string()))?;
        reply_rx
            .await
            .map_err(|_| RuntimeError::ReplyDropped(self.id.to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Time since the last `tell` or `ask`.
    pub fn idle_for(&self) -> Duration {
        let last = *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Instant::now().saturating_duration_since(last)
    }

    fn touch(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }
}

/// Spawns the mailbox task for `actor` and returns its address.
pub(crate) fn spawn<A: Actor>(
    actor_id: &str,
    actor: A,
    capacity: usize,
    snapshots: Arc<dyn SnapshotRepository>,
    metrics: Arc<SystemMetrics>,
) -> ActorRef<A> {
    let (sender, inbox) = mpsc::channel(capacity.max(1));
    let id: Arc<str> = Arc::from(actor_id);

    let task = Mailbox {
        id: id.clone(),
        actor,
        inbox,
        snapshots,
        metrics: metrics.clone(),
    };
    tokio::spawn(task.run());

    ActorRef {
        id,
        sender,
        last_activity: Arc::new(Mutex::new(Instant::now())),
        metrics,
    }
}

struct Mailbox<A: Actor> {
    id: Arc<str>,
    actor: A,
    inbox: mpsc::Receiver<Envelope<A>>,
    snapshots: Arc<dyn SnapshotRepository>,
    metrics: Arc<SystemMetrics>,
}

impl<A: Actor> Mailbox<A> {
    async fn run(mut self) {
        debug!(target: "runtime::actor", actor_id = %self.id, "Mailbox started");

        while let Some(envelope) = self.inbox.recv().await {
            match envelope {
                Envelope::Tell(message) => {
                    self.dispatch(message).await;
                }
                Envelope::Ask { message, reply } => {
                    let response = self.dispatch(message).await;
                    if reply.send(response).is_err() {
                        debug!(
                            target: "runtime::actor",
                            actor_id = %self.id,
                            "Reply dropped; caller gave up"
                        );
                    }
                }
                Envelope::Persist { reply } => {
                    let outcome = self.persist();
                    if let Some(reply) = reply {
                        let _ = reply.send(outcome);
                    }
                }
                Envelope::Stop { reply } => {
                    let outcome = self.persist();
                    let _ = reply.send(outcome);
                    debug!(target: "runtime::actor", actor_id = %self.id, "Mailbox stopped");
                    return;
                }
            }
        }

        // Every sender dropped without an explicit stop.
        self.persist();
        debug!(target: "runtime::actor", actor_id = %self.id, "Mailbox closed");
    }

    async fn dispatch(&mut self, message: A::Message) -> A::Reply {
        self.metrics.record_handled();
        match AssertUnwindSafe(self.actor.handle(message))
            .catch_unwind()
            .await
        {
            Ok(reply) => reply,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.metrics.record_panic();
                error!(
                    target: "runtime::actor",
                    actor_id = %self.id,
                    panic = %message,
                    "Handler panicked; actor keeps running"
                );
                A::failure_reply(ActorFailure::HandlerPanicked {
                    actor_id: self.id.to_string(),
                    message,
                })
            }
        }
    }

    fn persist(&mut self) -> PersistOutcome {
        if !self.actor.is_dirty() {
            return PersistOutcome::Clean;
        }

        let state = match self.actor.snapshot() {
            Ok(state) => state,
            Err(e) => {
                self.metrics.record_snapshot_failure();
                warn!(target: "runtime::actor", actor_id = %self.id, "Snapshot failed: {}", e);
                return PersistOutcome::Failed;
            }
        };

        let snapshot = ActorSnapshot::new(self.id.as_ref(), A::ACTOR_TYPE, state);
        match self.snapshots.upsert(&snapshot) {
            Ok(()) => {
                self.actor.mark_clean();
                self.metrics.record_snapshot_saved();
                debug!(
                    target: "runtime::actor",
                    actor_id = %self.id,
                    bytes = snapshot.state.len(),
                    "Snapshot saved"
                );
                PersistOutcome::Saved
            }
            Err(e) => {
                // Stays dirty; the next sweep retries.
                self.metrics.record_snapshot_failure();
                warn!(
                    target: "runtime::actor",
                    actor_id = %self.id,
                    "Snapshot write failed: {}",
                    e
                );
                PersistOutcome::Failed
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_rendered() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("kaput"));
        assert_eq!(panic_message(boxed.as_ref()), "kaput");

        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
