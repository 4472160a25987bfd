use battle_core::{BattleStatus, BattleType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a stored session row.
///
/// Wider than [`BattleStatus`]: `Pending` covers rows written before the
/// actor exists and `Expired` marks battles reaped by the idle sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Waiting,
    Active,
    Completed,
    Cancelled,
    Expired,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Cancelled | SessionStatus::Expired
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Waiting => "waiting",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Expired => "expired",
        }
    }
}

impl From<BattleStatus> for SessionStatus {
    fn from(status: BattleStatus) -> Self {
        match status {
            BattleStatus::Waiting => SessionStatus::Waiting,
            BattleStatus::Active => SessionStatus::Active,
            BattleStatus::Completed => SessionStatus::Completed,
            BattleStatus::Cancelled => SessionStatus::Cancelled,
        }
    }
}

/// Persistent row describing one battle session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub battle_type: BattleType,
    pub status: SessionStatus,
    pub host_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub winner_id: Option<String>,
    pub end_reason: Option<String>,
}

impl SessionRecord {
    /// A fresh `Waiting` row stamped with the current time.
    pub fn waiting(id: impl Into<String>, battle_type: BattleType, host_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            battle_type,
            status: SessionStatus::Waiting,
            host_id,
            created_at: now,
            updated_at: now,
            winner_id: None,
            end_reason: None,
        }
    }

    /// Whether startup recovery should bring this session back.
    pub fn is_recoverable(&self, since: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.created_at >= since
    }

    pub(crate) fn apply_status(
        &mut self,
        status: SessionStatus,
        winner_id: Option<&str>,
        end_reason: Option<&str>,
        at: DateTime<Utc>,
    ) {
        self.status = status;
        if let Some(winner) = winner_id {
            self.winner_id = Some(winner.to_owned());
        }
        if let Some(reason) = end_reason {
            self.end_reason = Some(reason.to_owned());
        }
        self.updated_at = at;
    }
}
