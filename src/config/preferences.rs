//! Process-wide user preferences (currently just the theme)
//!
//! Stored as a flat JSON object of string keys to string values. Unrelated to
//! any session: nothing here is cleared when a session ends.

use anyhow::{bail, Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Key the theme is stored under
pub const THEME_KEY: &str = "theme";

static PREFERENCES: OnceLock<Preferences> = OnceLock::new();

/// Key/value preference store backed by a JSON file
#[derive(Debug)]
pub struct Preferences {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl Preferences {
    /// Read preferences from `path`
    ///
    /// A missing or malformed file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed preferences {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read preferences {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            path,
            values: RwLock::new(values),
        }
    }

    /// Initialize the process-wide store. Later calls return the first store.
    pub fn init(path: impl Into<PathBuf>) -> &'static Preferences {
        let path = path.into();
        PREFERENCES.get_or_init(|| Self::load(path))
    }

    /// The process-wide store, if [`Preferences::init`] has run
    pub fn global() -> Option<&'static Preferences> {
        PREFERENCES.get()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    /// Set a value and write the store to disk
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write preferences {}", self.path.display()))
    }
}

/// Colour scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Stored theme, or the system default if none is stored
    pub fn init(prefs: &Preferences) -> Theme {
        prefs
            .get(THEME_KEY)
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(Theme::system_default)
    }

    /// Store a new theme
    pub fn set(prefs: &Preferences, theme: Theme) -> Result<()> {
        tracing::info!("Theme set to {}", theme.as_str());
        prefs.set(THEME_KEY, theme.as_str())
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Theme reported by the terminal through `COLORFGBG`
    pub fn system_default() -> Theme {
        Self::from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
    }

    /// Interpret a `COLORFGBG` value (`"fg;bg"` or `"fg;default;bg"`)
    ///
    /// Background colours 0-6 and 8 are dark; anything else, or no value, is light.
    pub fn from_colorfgbg(value: Option<&str>) -> Theme {
        let background = value
            .and_then(|v| v.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok());

        match background {
            Some(0..=6) | Some(8) => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => bail!("Unknown theme '{}'", other),
        }
    }
}
