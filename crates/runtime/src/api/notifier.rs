//! Delivery of timer-driven battle notices.
//!
//! Some notices are not a reply to anything the player just did: a battle
//! reaped by the idle sweep, or one brought back after a restart. The
//! [`Notifier`] trait decouples the manager from how those reach players.
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use battle_core::ParticipantId;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// The battle reached a terminal state.
    Ended,
    /// The idle sweep force-ended the battle.
    Expired,
    /// The battle was restored after a restart.
    Recovered,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleNotice {
    pub battle_id: String,
    pub kind: NoticeKind,
    pub message: String,
    /// Human participants the notice is addressed to.
    pub recipients: Vec<ParticipantId>,
}

impl BattleNotice {
    pub fn new(battle_id: impl Into<String>, kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            battle_id: battle_id.into(),
            kind,
            message: message.into(),
            recipients: Vec::new(),
        }
    }

    pub fn with_recipients(mut self, recipients: Vec<ParticipantId>) -> Self {
        self.recipients = recipients;
        self
    }
}

/// Sink for battle notices. Returns how many listeners received it.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &BattleNotice) -> usize;
}

/// Answers one pending interaction per battle.
///
/// A caller registers interest in a battle and awaits the receiver; the next
/// notice for that battle completes it. Notices with nobody waiting are
/// dropped.
#[derive(Default)]
pub struct ReplyNotifier {
    pending: Mutex<HashMap<String, oneshot::Sender<BattleNotice>>>,
}

impl ReplyNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the next notice about `battle_id`, replacing any earlier
    /// registration for it.
    pub fn register(&self, battle_id: impl Into<String>) -> oneshot::Receiver<BattleNotice> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(battle_id.into(), tx);
        rx
    }

    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Notifier for ReplyNotifier {
    fn notify(&self, notice: &BattleNotice) -> usize {
        let waiter = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&notice.battle_id);
        match waiter {
            Some(tx) => usize::from(tx.send(notice.clone()).is_ok()),
            None => 0,
        }
    }
}

/// Broadcasts every notice to all subscribers.
pub struct PushNotifier {
    tx: broadcast::Sender<BattleNotice>,
}

impl PushNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BattleNotice> {
        self.tx.subscribe()
    }
}

impl Default for PushNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for PushNotifier {
    fn notify(&self, notice: &BattleNotice) -> usize {
        // Fails only when nobody is subscribed.
        self.tx.send(notice.clone()).unwrap_or(0)
    }
}
