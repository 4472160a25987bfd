//! Repository contracts for the persistent store.

use chrono::{DateTime, Utc};

use super::Result;
use super::types::{ActorSnapshot, SessionRecord, SessionStatus};

/// Store for serialized actor state.
///
/// Rows are keyed by actor id; writes are upserts and the last write wins.
pub trait SnapshotRepository: Send + Sync {
    /// Insert or replace the snapshot for `snapshot.actor_id`.
    fn upsert(&self, snapshot: &ActorSnapshot) -> Result<()>;

    fn load(&self, actor_id: &str) -> Result<Option<ActorSnapshot>>;

    /// Remove a snapshot. Deleting a missing row is not an error.
    fn delete(&self, actor_id: &str) -> Result<()>;

    /// Actor ids with a stored snapshot, optionally filtered by actor type.
    fn list(&self, actor_type: Option<&str>) -> Result<Vec<String>>;
}

/// Store for battle session rows.
pub trait SessionRepository: Send + Sync {
    /// Insert or replace the row for `record.id`.
    fn upsert(&self, record: &SessionRecord) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<SessionRecord>>;

    /// Non-terminal sessions created at or after `since`, oldest first.
    fn list_recoverable(&self, since: DateTime<Utc>) -> Result<Vec<SessionRecord>>;

    /// Moves a row to `status` and stamps the end metadata.
    ///
    /// Returns `false` when no row exists. Repeating the same update is a
    /// no-op apart from `updated_at`.
    fn update_status(
        &self,
        id: &str,
        status: SessionStatus,
        winner_id: Option<&str>,
        end_reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<bool>;
}
