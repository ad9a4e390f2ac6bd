//! Configuration management

mod preferences;

pub use preferences::{Preferences, Theme, THEME_KEY};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub session: SessionConfig,
    pub invitation: InvitationConfig,
}

/// General settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Preference file override
    pub preferences_path: Option<PathBuf>,
}

/// Session lifetime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Countdown a new session starts with
    pub duration_seconds: u64,

    /// Upper bound for extending a session
    pub max_duration_seconds: u64,

    /// Seed new sessions with welcome entries
    pub welcome_messages: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 30 * 60,
            max_duration_seconds: 2 * 60 * 60,
            welcome_messages: true,
        }
    }
}

/// Invitation link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvitationConfig {
    /// Origin prepended to `/chat/<id>`
    pub origin: String,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific file, or return defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        } else {
            Config::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings no session could run with
    pub fn validate(&self) -> Result<()> {
        let session = &self.session;
        if session.duration_seconds == 0 {
            bail!("session.duration_seconds must be greater than zero");
        }
        if session.duration_seconds > session.max_duration_seconds {
            bail!(
                "session.duration_seconds ({}) exceeds session.max_duration_seconds ({})",
                session.duration_seconds,
                session.max_duration_seconds
            );
        }

        let origin = self.invitation.origin.trim();
        let host = origin
            .strip_prefix("https://")
            .or_else(|| origin.strip_prefix("http://"))
            .map(|rest| rest.trim_matches('/'));
        if host.map_or(true, str::is_empty) {
            bail!("invitation.origin must be an http(s) URL, got '{}'", origin);
        }

        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Get the preference file path
    pub fn preferences_path(&self) -> PathBuf {
        self.general
            .preferences_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("preferences.json"))
    }

    fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ephemera")
    }
}
