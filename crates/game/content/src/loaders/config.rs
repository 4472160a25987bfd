//! Battle rule configuration loader.

use std::path::Path;

use battle_core::BattleConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for battle tuning from TOML files. Missing keys keep their
/// defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        Self::parse(&read_file(path)?)
    }

    pub fn parse(content: &str) -> LoadResult<BattleConfig> {
        let config: BattleConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if !(0.0..=1.0).contains(&config.base_flee_chance) {
            anyhow::bail!(
                "base_flee_chance must be within [0, 1], got {}",
                config.base_flee_chance
            );
        }
        if config.critical_chance > 100 {
            anyhow::bail!(
                "critical_chance is a percentage, got {}",
                config.critical_chance
            );
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse("critical_chance = 25\n").unwrap();
        assert_eq!(config.critical_chance, 25);
        assert_eq!(config.weather_turns, BattleConfig::DEFAULT_WEATHER_TURNS);
    }

    #[test]
    fn rejects_out_of_range_flee_chance() {
        assert!(ConfigLoader::parse("base_flee_chance = 1.5\n").is_err());
    }
}
