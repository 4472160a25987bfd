use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::repository::{RepositoryError, Result, SessionRecord, SessionRepository, SessionStatus};

/// In-memory implementation of [`SessionRepository`].
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn upsert(&self, record: &SessionRecord) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RepositoryError::Poisoned { store: "session" })?;
        sessions.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<SessionRecord>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RepositoryError::Poisoned { store: "session" })?;
        Ok(sessions.get(id).cloned())
    }

    fn list_recoverable(&self, since: DateTime<Utc>) -> Result<Vec<SessionRecord>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RepositoryError::Poisoned { store: "session" })?;
        let mut rows: Vec<SessionRecord> = sessions
            .values()
            .filter(|row| row.is_recoverable(since))
            .cloned()
            .collect();
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
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RepositoryError::Poisoned { store: "session" })?;
        match sessions.get_mut(id) {
            Some(row) => {
                row.apply_status(status, winner_id, end_reason, at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
