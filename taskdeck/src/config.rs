//! Configuration for the taskdeck store.
//!
//! Layered with the following priority (highest first):
//! 1. TOML config file (`~/.config/taskdeck/config.toml`)
//! 2. Compiled defaults
//!
//! A missing default config file is not an error (defaults are used).
//! An explicit path that doesn't exist is an error.

use std::path::{Path, PathBuf};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Could not determine the user's config directory.
    #[error("could not determine config directory (no HOME or XDG_CONFIG_HOME)")]
    NoConfigDir,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    store: StoreFileConfig,
}

/// `[store]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoreFileConfig {
    min_query_len: Option<usize>,
    event_buffer: Option<usize>,
    load_on_create: Option<bool>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Minimum query length before text filtering kicks in; shorter
    /// queries return the unfiltered set. Observed UIs vary here, so it
    /// is a knob rather than a constant.
    pub min_query_len: usize,
    /// Buffer size for the cache event channel.
    pub event_buffer: usize,
    /// Whether `create` reloads the collection to absorb server-assigned
    /// columns. Disabled only by callers that batch-create and load once.
    pub load_on_create: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            min_query_len: 1,
            event_buffer: 64,
            load_on_create: true,
        }
    }
}

impl StoreConfig {
    /// Load configuration from a TOML file merged over defaults.
    ///
    /// If `path` is given and the file does not exist, returns an error.
    /// If no path is given, the default location
    /// (`~/.config/taskdeck/config.toml`) is tried and silently ignored
    /// if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit config file cannot be read
    /// or parsed, or if the default config directory cannot be
    /// determined when it is needed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = load_config_file(path)?;
        Ok(Self::resolve(&file))
    }

    /// Resolve a `StoreConfig` from a parsed config file over defaults.
    fn resolve(file: &ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            min_query_len: file.store.min_query_len.unwrap_or(defaults.min_query_len),
            event_buffer: file.store.event_buffer.unwrap_or(defaults.event_buffer),
            load_on_create: file.store.load_on_create.unwrap_or(defaults.load_on_create),
        }
    }
}

/// Reads and parses the config file, explicit or default-located.
fn load_config_file(explicit: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let Some(dir) = dirs::config_dir() else {
                return Err(ConfigError::NoConfigDir);
            };
            let path = dir.join("taskdeck").join("config.toml");
            if !path.exists() {
                return Ok(ConfigFile::default());
            }
            path
        }
    };
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
        path: path.clone(),
        source,
    })?;
    Ok(toml::from_str(&contents)?)
}
