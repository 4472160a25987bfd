use std::sync::Arc;

use battle_cache::CacheManager;
use battle_core::{BattleConfig, GameDataOracle};

use super::{BattleFactory, BattleManager};
use crate::actor::ActorSystem;
use crate::api::{Notifier, PushNotifier, Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::oracle::CachedGameData;
use crate::repository::{
    FileSessionRepository, FileSnapshotRepository, InMemorySessionRepository,
    InMemorySnapshotRepository, SessionRepository, SnapshotRepository,
};

/// Builder for [`BattleManager`].
///
/// Game data is required. Repositories default to files under the configured
/// data directory, the notifier to a [`PushNotifier`] and the cache manager
/// to a private one.
#[derive(Default)]
pub struct BattleManagerBuilder {
    config: RuntimeConfig,
    battle_config: Option<BattleConfig>,
    game_data: Option<Arc<dyn GameDataOracle>>,
    snapshots: Option<Arc<dyn SnapshotRepository>>,
    sessions: Option<Arc<dyn SessionRepository>>,
    notifier: Option<Arc<dyn Notifier>>,
    caches: Option<Arc<CacheManager>>,
}

impl BattleManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Rule tuning handed to every engine.
    pub fn battle_config(mut self, config: BattleConfig) -> Self {
        self.battle_config = Some(config);
        self
    }

    pub fn game_data(mut self, data: Arc<dyn GameDataOracle>) -> Self {
        self.game_data = Some(data);
        self
    }

    pub fn snapshots(mut self, snapshots: Arc<dyn SnapshotRepository>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub fn sessions(mut self, sessions: Arc<dyn SessionRepository>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Keeps every row and snapshot in memory.
    pub fn in_memory(self) -> Self {
        self.snapshots(Arc::new(InMemorySnapshotRepository::new()))
            .sessions(Arc::new(InMemorySessionRepository::new()))
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn cache_manager(mut self, caches: Arc<CacheManager>) -> Self {
        self.caches = Some(caches);
        self
    }

    pub fn build(self) -> Result<Arc<BattleManager>> {
        let source = self.game_data.ok_or(RuntimeError::MissingGameData)?;
        let caches = self.caches.unwrap_or_default();
        let data = CachedGameData::new(
            source,
            &caches,
            self.config.cache_capacity,
            self.config.cache_ttl,
        )?;

        let snapshots: Arc<dyn SnapshotRepository> = match self.snapshots {
            Some(snapshots) => snapshots,
            None => Arc::new(FileSnapshotRepository::new(self.config.snapshots_dir())?),
        };
        let sessions: Arc<dyn SessionRepository> = match self.sessions {
            Some(sessions) => sessions,
            None => Arc::new(FileSessionRepository::new(self.config.sessions_dir())?),
        };
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(PushNotifier::default()));

        let mut factory = BattleFactory::new(Arc::new(data));
        if let Some(battle_config) = self.battle_config {
            factory = factory.with_config(battle_config);
        }
        let system = Arc::new(ActorSystem::new(
            Arc::new(factory),
            snapshots,
            self.config.mailbox_capacity,
            self.config.ask_timeout,
        ));

        Ok(Arc::new(BattleManager::new(
            self.config,
            system,
            sessions,
            notifier,
            caches,
        )))
    }
}
