//! Failures of the battle session and snapshot stores.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A writer panicked while holding an in-memory store lock.
    #[error("{store} store is unusable after a writer panicked")]
    Poisoned { store: &'static str },

    #[error("store file access failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot of {actor_id} cannot be {action}: {reason}")]
    SnapshotPayload {
        actor_id: String,
        action: &'static str,
        reason: String,
    },

    #[error("session row {battle_id} cannot be {action}: {reason}")]
    SessionRow {
        battle_id: String,
        action: &'static str,
        reason: String,
    },

    /// A file in a store directory whose name does not decode to a row id.
    #[error("{} is not a row file: {reason}", path.display())]
    ForeignFile { path: PathBuf, reason: String },

    /// The file named after one id holds the row of another.
    #[error("row file for {requested} holds {stored}")]
    MisfiledRow { requested: String, stored: String },
}

impl RepositoryError {
    pub(crate) fn snapshot(actor_id: &str, action: &'static str, reason: impl ToString) -> Self {
        Self::SnapshotPayload {
            actor_id: actor_id.to_owned(),
            action,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn session(battle_id: &str, action: &'static str, reason: impl ToString) -> Self {
        Self::SessionRow {
            battle_id: battle_id.to_owned(),
            action,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_row() {
        let err = RepositoryError::snapshot("battle-0042", "decoded", "unexpected end of file");
        assert_eq!(
            err.to_string(),
            "snapshot of battle-0042 cannot be decoded: unexpected end of file"
        );

        let err = RepositoryError::MisfiledRow {
            requested: "a".into(),
            stored: "b".into(),
        };
        assert_eq!(err.to_string(), "row file for a holds b");

        let err = RepositoryError::Poisoned { store: "session" };
        assert_eq!(err.to_string(), "session store is unusable after a writer panicked");
    }
}
