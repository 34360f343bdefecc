//! Secret management for the model backend.
//!
//! Supports reading secrets from `~/.config/swarm/secret.json`. The
//! `GEMINI_API_KEY` environment variable takes precedence over the file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use swarm_core::SwarmError;

/// Environment variable consulted before secret.json.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Overrides the model chosen per query.
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Loads the secret configuration from `path`.
///
/// # Errors
///
/// A missing or unreadable file is a `Config` error; malformed JSON is a
/// `Serialization` error.
pub fn load_secret_config_from(path: &Path) -> Result<SecretConfig, SwarmError> {
    if !path.exists() {
        return Err(SwarmError::config(format!(
            "Configuration file not found at: {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        SwarmError::config(format!(
            "Failed to read configuration file at {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(serde_json::from_str(&content)?)
}

/// Loads the secret configuration file from ~/.config/swarm/secret.json
pub fn load_secret_config() -> Result<SecretConfig, SwarmError> {
    load_secret_config_from(&secret_path()?)
}

/// Resolves the Gemini credentials, preferring the environment.
pub fn resolve_gemini_config() -> Result<GeminiConfig, SwarmError> {
    let env_key = std::env::var(API_KEY_ENV).ok();
    resolve_gemini_config_from(env_key, &secret_path()?)
}

/// Resolves credentials from an explicit environment value and secret file.
///
/// A non-blank `env_key` wins; the file then only contributes
/// `model_name`, and its absence is not an error.
pub fn resolve_gemini_config_from(
    env_key: Option<String>,
    path: &Path,
) -> Result<GeminiConfig, SwarmError> {
    let env_key = env_key.filter(|key| !key.trim().is_empty());

    if let Some(api_key) = env_key {
        let model_name = load_secret_config_from(path)
            .ok()
            .and_then(|config| config.gemini)
            .and_then(|gemini| gemini.model_name);
        tracing::debug!("[SecretConfig] using {} from environment", API_KEY_ENV);
        return Ok(GeminiConfig {
            api_key,
            model_name,
        });
    }

    load_secret_config_from(path)?.gemini.ok_or_else(|| {
        SwarmError::config(format!(
            "Gemini configuration not found in {} and {} is not set",
            path.display(),
            API_KEY_ENV
        ))
    })
}

/// Returns the path to the secret file: ~/.config/swarm/secret.json
fn secret_path() -> Result<PathBuf, SwarmError> {
    let home =
        dirs::home_dir().ok_or_else(|| SwarmError::config("Could not determine home directory"))?;
    Ok(home.join(".config").join("swarm").join("secret.json"))
}
