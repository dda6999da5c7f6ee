//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/litman/config.toml)
//! 3. Environment variables (LITMAN_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "LITMAN";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Library directory (library file, cache, managed documents, backups)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Allowed categories; empty allows any
    #[serde(default)]
    pub categories: Vec<String>,

    /// Record the pre-import location of added documents
    #[serde(default)]
    pub keep_original: bool,

    /// Move documents of removed entries to files/archive instead of deleting them
    #[serde(default = "default_true")]
    pub archive_removed: bool,

    /// Load through the SQLite cache when it is fresh
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Log file path (default: stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            categories: Vec::new(),
            keep_original: false,
            archive_removed: true,
            use_cache: true,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (LITMAN_DATA_DIR, LITMAN_KEEP_ORIGINAL, LITMAN_USE_CACHE)
    /// 2. Config file (~/.config/litman/config.toml or LITMAN_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Configuration rooted at `data_dir` with every other value defaulted
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // LITMAN_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = expand_home(&val);
        }

        // LITMAN_KEEP_ORIGINAL
        if let Ok(val) = std::env::var(format!("{}_KEEP_ORIGINAL", ENV_PREFIX)) {
            self.keep_original = parse_flag(&val);
        }

        // LITMAN_USE_CACHE
        if let Ok(val) = std::env::var(format!("{}_USE_CACHE", ENV_PREFIX)) {
            self.use_cache = parse_flag(&val);
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with LITMAN_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("litman")
            .join("config.toml")
    }

    /// Check a category against the allowed list
    pub fn allows_category(&self, category: &str) -> bool {
        self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|c| c.trim().to_lowercase() == category.trim().to_lowercase())
    }

    /// Get the path to the authoritative library file
    pub fn library_path(&self) -> PathBuf {
        self.data_dir.join("litman.json")
    }

    /// Get the path to the SQLite cache
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("litman.db")
    }

    /// Get the directory holding managed documents
    pub fn files_dir(&self) -> PathBuf {
        self.data_dir.join("files")
    }

    /// Get the directory holding library backups
    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("litman")
}

fn default_true() -> bool {
    true
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest.trim_start_matches('/')),
        None => PathBuf::from(path),
    }
}
