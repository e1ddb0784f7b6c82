//! Configuration layer: typed cache settings with layered precedence (file → env).

use std::num::NonZeroUsize;
use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

const LOCAL_CONFIG_BASENAME: &str = "squadra";
const ENV_PREFIX: &str = "SQUADRA";
const DEFAULT_MAX_ENTRIES: usize = 2000;

/// Cache settings from `squadra.toml`, overridable via `SQUADRA_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Enable the in-memory side-cache. When disabled the store answers every
    /// read with a miss and drops writes; invalidation stays a no-op.
    pub enabled: bool,
    /// Maximum entries held by the in-memory store before LRU eviction.
    pub max_entries: usize,
    /// Enable best-effort wildcard pattern removal. Stores without prefix
    /// scanning leave this off and rely on explicit batches alone.
    pub pattern_invalidation: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: DEFAULT_MAX_ENTRIES,
            pattern_invalidation: true,
        }
    }
}

impl CacheSettings {
    /// Load settings from an optional TOML file plus environment overrides.
    ///
    /// Without an explicit path, a `squadra.toml` next to the process is
    /// picked up when present; missing files fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false)),
        };
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Returns the entry limit as `NonZeroUsize`, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cache configuration could not be loaded: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let settings = CacheSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.max_entries, 2000);
        assert!(settings.pattern_invalidation);
    }

    #[test]
    fn max_entries_clamps_to_min() {
        let settings = CacheSettings {
            max_entries: 0,
            ..Default::default()
        };
        assert_eq!(settings.max_entries_non_zero().get(), 1);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let settings =
            CacheSettings::load(Some(Path::new("/nonexistent/squadra.toml"))).or_else(|_| {
                // No file next to the test binary either; defaults apply.
                CacheSettings::load(None)
            });
        let settings = settings.expect("settings should load from defaults");
        assert!(settings.enabled);
    }
}
