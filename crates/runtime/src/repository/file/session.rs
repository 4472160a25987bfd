use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::repository::{RepositoryError, Result, SessionRecord, SessionRepository, SessionStatus};

use super::{list_ids, remove_if_exists, row_path, write_atomic};

/// File-based implementation of [`SessionRepository`].
///
/// Rows are pretty-printed JSON so operators can inspect them by hand.
pub struct FileSessionRepository {
    base_dir: PathBuf,
}

impl FileSessionRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        row_path(&self.base_dir, id, "json")
    }

    fn read(&self, id: &str) -> Result<SessionRecord> {
        let bytes = fs::read(self.record_path(id))?;
        let row: SessionRecord = serde_json::from_slice(&bytes)
            .map_err(|e| RepositoryError::session(id, "decoded", e))?;
        if row.id != id {
            return Err(RepositoryError::MisfiledRow {
                requested: id.to_owned(),
                stored: row.id,
            });
        }
        Ok(row)
    }

    fn write(&self, record: &SessionRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| RepositoryError::session(&record.id, "encoded", e))?;
        write_atomic(&self.record_path(&record.id), &json)
    }

    /// Removes a row entirely.
    pub fn delete(&self, id: &str) -> Result<()> {
        remove_if_exists(&self.record_path(id))
    }
}

impl SessionRepository for FileSessionRepository {
    fn upsert(&self, record: &SessionRecord) -> Result<()> {
        self.write(record)?;
        tracing::debug!(
            target: "runtime::repository",
            session = %record.id,
            status = record.status.as_str(),
            "Saved session row"
        );
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<SessionRecord>> {
        if !self.record_path(id).exists() {
            return Ok(None);
        }
        self.read(id).map(Some)
    }

    fn list_recoverable(&self, since: DateTime<Utc>) -> Result<Vec<SessionRecord>> {
        let mut rows = Vec::new();
        for id in list_ids(&self.base_dir, "json")? {
            let row = self.read(&id)?;
            if row.is_recoverable(since) {
                rows.push(row);
            }
        }
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    fn update_status(
        &self,
        id: &str,
        status: SessionStatus,
        winner_id: Option<&str>,
        end_reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(mut row) = self.get(id)? else {
            return Ok(false);
        };
        row.apply_status(status, winner_id, end_reason, at);
        self.write(&row)?;
        Ok(true)
    }
}
