use std::collections::HashMap;
use std::sync::RwLock;

use crate::repository::{ActorSnapshot, RepositoryError, Result, SnapshotRepository};

/// In-memory implementation of [`SnapshotRepository`].
#[derive(Default)]
pub struct InMemorySnapshotRepository {
    snapshots: RwLock<HashMap<String, ActorSnapshot>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotRepository for InMemorySnapshotRepository {
    fn upsert(&self, snapshot: &ActorSnapshot) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::Poisoned { store: "snapshot" })?;
        snapshots.insert(snapshot.actor_id.clone(), snapshot.clone());
        Ok(())
    }

    fn load(&self, actor_id: &str) -> Result<Option<ActorSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::Poisoned { store: "snapshot" })?;
        Ok(snapshots.get(actor_id).cloned())
    }

    fn delete(&self, actor_id: &str) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::Poisoned { store: "snapshot" })?;
        snapshots.remove(actor_id);
        Ok(())
    }

    fn list(&self, actor_type: Option<&str>) -> Result<Vec<String>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::Poisoned { store: "snapshot" })?;
        let mut ids: Vec<String> = snapshots
            .values()
            .filter(|s| actor_type.is_none_or(|t| s.actor_type == t))
            .map(|s| s.actor_id.clone())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
