//! Application configuration.
//!
//! Read from `~/.config/swarm/config.toml`. The file is optional; a missing
//! file yields defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SwarmError};
use crate::session::{ModelChoice, QueryConfig};

const DEFAULT_REPLAY_CHUNK_SIZE: usize = 48;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct SwarmConfig {
    #[serde(default)]
    pub query: QueryDefaults,
    #[serde(default)]
    pub stream: StreamSettings,
}

/// Defaults applied to every submitted query.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct QueryDefaults {
    #[serde(default)]
    pub model: ModelChoice,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub use_maps: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StreamSettings {
    /// Fragment size, in characters, used when replaying transcripts.
    #[serde(default = "default_replay_chunk_size")]
    pub replay_chunk_size: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            replay_chunk_size: DEFAULT_REPLAY_CHUNK_SIZE,
        }
    }
}

fn default_replay_chunk_size() -> usize {
    DEFAULT_REPLAY_CHUNK_SIZE
}

impl SwarmConfig {
    /// Returns the path to the configuration file: ~/.config/swarm/config.toml
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SwarmError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("swarm").join("config.toml"))
    }

    /// Loads the configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Loads the configuration from `path`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file exists but cannot be read, or a
    /// serialization error if it is not valid TOML for this schema.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("[SwarmConfig] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: SwarmConfig = toml::from_str(&content)?;
        tracing::debug!("[SwarmConfig] loaded {}", path.display());
        Ok(config)
    }

    /// Builds the query configuration these defaults describe.
    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            model: self.query.model,
            persona: self.query.persona.clone(),
            use_maps: self.query.use_maps,
            ..QueryConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = SwarmConfig::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, SwarmConfig::default());
        assert_eq!(config.stream.replay_chunk_size, DEFAULT_REPLAY_CHUNK_SIZE);
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[query]\nmodel = \"pro\"\npersona = \"travel journalist\"\nuse_maps = true\n",
        )
        .unwrap();

        let config = SwarmConfig::load_from(&path).unwrap();
        assert_eq!(config.query.model, ModelChoice::Pro);
        assert_eq!(config.stream.replay_chunk_size, DEFAULT_REPLAY_CHUNK_SIZE);

        let query_config = config.query_config();
        assert!(query_config.use_maps);
        assert_eq!(query_config.persona.as_deref(), Some("travel journalist"));
        assert!(query_config.history.is_empty());
    }

    #[test]
    fn test_malformed_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[query]\nmodel = \"ultra\"\n").unwrap();

        let err = SwarmConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, SwarmError::Serialization { ref format, .. } if format == "TOML"));
    }
}
