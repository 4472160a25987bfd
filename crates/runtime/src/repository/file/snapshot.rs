use std::fs;
use std::path::{Path, PathBuf};

use crate::repository::{ActorSnapshot, RepositoryError, Result, SnapshotRepository};

use super::{list_ids, remove_if_exists, row_path, write_atomic};

/// File-based implementation of [`SnapshotRepository`].
///
/// Each snapshot is a bincode file named after the hex-encoded actor id.
pub struct FileSnapshotRepository {
    base_dir: PathBuf,
}

impl FileSnapshotRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn snapshot_path(&self, actor_id: &str) -> PathBuf {
        row_path(&self.base_dir, actor_id, "bin")
    }

    fn read(&self, actor_id: &str) -> Result<ActorSnapshot> {
        let bytes = fs::read(self.snapshot_path(actor_id))?;
        let snapshot: ActorSnapshot = bincode::deserialize(&bytes)
            .map_err(|e| RepositoryError::snapshot(actor_id, "decoded", e))?;
        if snapshot.actor_id != actor_id {
            return Err(RepositoryError::MisfiledRow {
                requested: actor_id.to_owned(),
                stored: snapshot.actor_id,
            });
        }
        Ok(snapshot)
    }
}

impl SnapshotRepository for FileSnapshotRepository {
    fn upsert(&self, snapshot: &ActorSnapshot) -> Result<()> {
        let path = self.snapshot_path(&snapshot.actor_id);
        let bytes = bincode::serialize(snapshot)
            .map_err(|e| RepositoryError::snapshot(&snapshot.actor_id, "encoded", e))?;
        write_atomic(&path, &bytes)?;

        tracing::debug!(
            target: "runtime::repository",
            actor_id = %snapshot.actor_id,
            bytes = bytes.len(),
            "Saved snapshot to {}",
            path.display()
        );
        Ok(())
    }

    fn load(&self, actor_id: &str) -> Result<Option<ActorSnapshot>> {
        if !self.snapshot_path(actor_id).exists() {
            return Ok(None);
        }
        self.read(actor_id).map(Some)
    }

    fn delete(&self, actor_id: &str) -> Result<()> {
        remove_if_exists(&self.snapshot_path(actor_id))
    }

    fn list(&self, actor_type: Option<&str>) -> Result<Vec<String>> {
        let ids = list_ids(&self.base_dir, "bin")?;
        let Some(actor_type) = actor_type else {
            return Ok(ids);
        };

        let mut matching = Vec::with_capacity(ids.len());
        for id in ids {
            if self.read(&id)?.actor_type == actor_type {
                matching.push(id);
            }
        }
        Ok(matching)
    }
}
