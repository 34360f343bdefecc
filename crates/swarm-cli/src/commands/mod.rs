pub mod ask;
pub mod classify;
pub mod replay;

use anyhow::{Context, Result};
use std::path::Path;
use swarm_core::config::SwarmConfig;

/// Loads config.toml from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<SwarmConfig> {
    let config = match path {
        Some(path) => SwarmConfig::load_from(path),
        None => SwarmConfig::load(),
    };
    config.context("Failed to load config.toml")
}
