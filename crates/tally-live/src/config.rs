//! # Tally Configuration
//!
//! Configuration shared by every front end.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_DB_PATH=/data/tally.db                                       │
//! │     TALLY_CACHE_ENABLED=false                                          │
//! │     TALLY_CACHE_KEY=tally.location_counts                              │
//! │     TALLY_OUTPUT_DIR=/tmp/sheets                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally/tally.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.tally.tally/tally.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # tally.toml
//! [store]
//! database_path = "/home/me/.local/share/tally/tally.db"
//! max_connections = 5
//!
//! [cache]
//! enabled = true
//! key = "tally.location_counts"
//!
//! [print]
//! output_dir = "."
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::cache::DEFAULT_CACHE_KEY;
use crate::error::{LiveError, LiveResult};

// =============================================================================
// Store Settings
// =============================================================================

/// Where the document store lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("tally.db"))
        .unwrap_or_else(|| PathBuf::from("tally.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            database_path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Aggregate cache behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Show cached counts on start-up and keep them up to date.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Key the counts are stored under.
    #[serde(default = "default_cache_key")]
    pub key: String,
}

fn default_true() -> bool {
    true
}

fn default_cache_key() -> String {
    DEFAULT_CACHE_KEY.to_string()
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            enabled: true,
            key: default_cache_key(),
        }
    }
}

// =============================================================================
// Print Settings
// =============================================================================

/// Where printable sheets are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for PrintSettings {
    fn default() -> Self {
        PrintSettings {
            output_dir: default_output_dir(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TallyConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub print: PrintSettings,
}

impl TallyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tally.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> LiveResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> LiveResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| LiveError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LiveError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| LiveError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LiveResult<()> {
        if self.store.database_path.as_os_str().is_empty() {
            return Err(LiveError::InvalidConfig(
                "store.database_path must not be empty".into(),
            ));
        }

        if self.store.max_connections == 0 {
            return Err(LiveError::InvalidConfig(
                "store.max_connections must be greater than 0".into(),
            ));
        }

        if self.cache.enabled && self.cache.key.trim().is_empty() {
            return Err(LiveError::InvalidConfig(
                "cache.key must not be empty while the cache is enabled".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("TALLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = PathBuf::from(path);
        }

        if let Some(enabled) = var("TALLY_CACHE_ENABLED") {
            match parse_bool(&enabled) {
                Some(enabled) => self.cache.enabled = enabled,
                None => warn!(value = %enabled, "Ignoring TALLY_CACHE_ENABLED"),
            }
        }

        if let Some(key) = var("TALLY_CACHE_KEY") {
            self.cache.key = key;
        }

        if let Some(dir) = var("TALLY_OUTPUT_DIR") {
            debug!(dir = %dir, "Overriding output directory from environment");
            self.print.output_dir = PathBuf::from(dir);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("tally.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn database_path(&self) -> &Path {
        &self.store.database_path
    }

    /// Cache key, or `None` when the cache is disabled.
    pub fn cache_key(&self) -> Option<&str> {
        self.cache.enabled.then_some(self.cache.key.as_str())
    }

    pub fn output_dir(&self) -> &Path {
        &self.print.output_dir
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "tally", "tally")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
