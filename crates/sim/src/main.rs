//! Battle simulator.
//!
//! Wires content, configuration and the battle manager together, recovers
//! any open battles from the data directory and plays one PvE battle
//! against an NPC to completion.
//!
//! Environment variables (a `.env` file is honoured):
//! - `BATTLE_CONTENT_DIR` - RON content directory (default: embedded content)
//! - `BATTLE_DEMO_SEED` - Seed for the demo battle (default: random)
//! - `RUST_LOG` - Log filter (default: `info`)
//! - `BATTLE_*` - Runtime tuning, see `RuntimeConfig::from_env`
mod demo;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use battle_content::ContentFactory;
use battle_core::{BattleConfig, GameDataOracle};
use battle_runtime::{BattleManager, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = RuntimeConfig::from_env();
    let _log_guard = logging::setup_logging(&config.data_dir.join("logs"))?;

    let (game_data, battle_config) = load_content()?;

    let manager = BattleManager::builder()
        .config(config)
        .battle_config(battle_config)
        .game_data(game_data)
        .build()
        .context("failed to build battle manager")?;

    let recovered = manager.start().await?;
    if recovered > 0 {
        tracing::info!("Recovered {} open battles", recovered);
    }

    let seed = std::env::var("BATTLE_DEMO_SEED")
        .ok()
        .and_then(|s| s.parse().ok());
    let result = demo::run_pve(&manager, seed).await;

    let metrics = manager.metrics();
    tracing::info!(
        active = metrics.active_battles,
        spawned = metrics.actors.spawned,
        asks = metrics.actors.asks,
        panics = metrics.actors.panics,
        "Manager metrics"
    );
    for op in &metrics.operations {
        tracing::info!(
            operation = op.operation,
            calls = op.calls,
            failures = op.failures,
            avg_us = op.avg.as_micros() as u64,
            "Operation latency"
        );
    }
    for cache in &metrics.caches {
        tracing::info!(
            cache = %cache.name,
            hits = cache.stats.hits,
            misses = cache.stats.misses,
            "Cache stats"
        );
    }

    let report = manager.shutdown().await;
    tracing::info!(
        saved = report.saved,
        failed = report.failed,
        "Shutdown complete"
    );

    result
}

/// Content from `BATTLE_CONTENT_DIR`, or the embedded set when unset.
fn load_content() -> Result<(Arc<dyn GameDataOracle>, BattleConfig)> {
    match std::env::var("BATTLE_CONTENT_DIR") {
        Ok(dir) => {
            let factory = ContentFactory::new(&dir);
            let data = factory
                .load_game_data()
                .with_context(|| format!("failed to load content from {dir}"))?;
            let config = factory
                .load_config()
                .with_context(|| format!("failed to load battle config from {dir}"))?;
            tracing::info!("Loaded content from {}", dir);
            Ok((Arc::new(data), config))
        }
        Err(_) => {
            let data = battle_content::embedded_game_data()?;
            Ok((Arc::new(data), BattleConfig::default()))
        }
    }
}
