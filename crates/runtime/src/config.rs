//! Runtime tuning knobs.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration shared by the actor system, the battle manager and the
/// background sweeps.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Root for file-backed repositories.
    pub data_dir: PathBuf,
    /// Bounded mailbox size per actor.
    pub mailbox_capacity: usize,
    /// Default timeout for `ask`.
    pub ask_timeout: Duration,
    /// Interval of the dirty-actor persistence sweep.
    pub persist_interval: Duration,
    /// Actors idle longer than this are force-ended by the cleanup sweep.
    pub idle_timeout: Duration,
    pub cleanup_interval: Duration,
    /// Sessions created within this window are recovered on startup.
    pub recovery_window: Duration,
    /// Upper bound callers wait for a running recovery before proceeding.
    pub recovery_wait: Duration,
    pub recovery_poll: Duration,
    pub cache_capacity: usize,
    pub cache_ttl: Option<Duration>,
    pub cache_sweep_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            mailbox_capacity: 64,
            ask_timeout: Duration::from_secs(5),
            persist_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60 * 60),
            cleanup_interval: Duration::from_secs(5 * 60),
            recovery_window: Duration::from_secs(24 * 60 * 60),
            recovery_wait: Duration::from_secs(2),
            recovery_poll: Duration::from_millis(50),
            cache_capacity: 256,
            cache_ttl: Some(Duration::from_secs(10 * 60)),
            cache_sweep_interval: Duration::from_secs(60),
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_DATA_DIR` - Directory for session rows and snapshots
    /// - `BATTLE_MAILBOX_CAPACITY` - Messages buffered per actor (default: 64)
    /// - `BATTLE_ASK_TIMEOUT_MS` - Ask timeout in milliseconds (default: 5000)
    /// - `BATTLE_PERSIST_INTERVAL_SECS` - Persistence sweep interval (default: 30)
    /// - `BATTLE_IDLE_TIMEOUT_SECS` - Idle threshold before cleanup (default: 3600)
    /// - `BATTLE_CLEANUP_INTERVAL_SECS` - Cleanup sweep interval (default: 300)
    /// - `BATTLE_RECOVERY_WINDOW_HOURS` - Recovery look-back (default: 24)
    /// - `BATTLE_CACHE_CAPACITY` - Entries per game-data cache (default: 256)
    /// - `BATTLE_CACHE_TTL_SECS` - Cache entry TTL, `0` disables (default: 600)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("BATTLE_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Some(capacity) = read_env::<usize>("BATTLE_MAILBOX_CAPACITY") {
            config.mailbox_capacity = capacity.max(1);
        }
        if let Some(ms) = read_env::<u64>("BATTLE_ASK_TIMEOUT_MS") {
            config.ask_timeout = Duration::from_millis(ms.max(1));
        }
        if let Some(secs) = read_env::<u64>("BATTLE_PERSIST_INTERVAL_SECS") {
            config.persist_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = read_env::<u64>("BATTLE_IDLE_TIMEOUT_SECS") {
            config.idle_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = read_env::<u64>("BATTLE_CLEANUP_INTERVAL_SECS") {
            config.cleanup_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(hours) = read_env::<u64>("BATTLE_RECOVERY_WINDOW_HOURS") {
            config.recovery_window = Duration::from_secs(hours * 60 * 60);
        }
        if let Some(capacity) = read_env::<usize>("BATTLE_CACHE_CAPACITY") {
            config.cache_capacity = capacity.max(1);
        }
        if let Some(secs) = read_env::<u64>("BATTLE_CACHE_TTL_SECS") {
            config.cache_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }
}

/// Platform data directory, falling back to `./battle_data`.
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "battle")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./battle_data"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
