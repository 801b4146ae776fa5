//! Configuration for the meshkv store.
//!
//! [`KvConfig`] names the two store files and sizes the recency cache. It is
//! usually loaded from `meshkv.toml`:
//!
//! ```toml
//! path = "/var/lib/meshkv/meshkv.redb"
//! index_path = "/var/lib/meshkv/meshkv_index.redb"
//! cache_size = 30
//! ```
//!
//! Every field is optional; missing fields fall back to two sibling files in
//! the working directory and a 30-entry cache.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::paths;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Store locations and cache sizing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KvConfig {
    /// Primary store file (digest -> serialized value).
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Index store file (logical key -> digest).
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
    /// Maximum number of decoded values kept in memory.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_path() -> PathBuf {
    PathBuf::from(constants::DEFAULT_PRIMARY_FILE)
}

fn default_index_path() -> PathBuf {
    PathBuf::from(constants::DEFAULT_INDEX_FILE)
}

fn default_cache_size() -> usize {
    constants::DEFAULT_CACHE_SIZE
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            index_path: default_index_path(),
            cache_size: default_cache_size(),
        }
    }
}

impl KvConfig {
    /// Places both store files under `dir` with their default names.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            path: dir.join(constants::DEFAULT_PRIMARY_FILE),
            index_path: dir.join(constants::DEFAULT_INDEX_FILE),
            ..Self::default()
        }
    }

    /// Overrides the cache size.
    #[must_use]
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Load configuration from the meshkv home directory.
    ///
    /// Reads `~/.meshkv/meshkv.toml` (or `$MESHKV_HOME/meshkv.toml`) when it
    /// exists. Otherwise both stores default to files inside that directory.
    /// Relative paths in the file are resolved against the home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let home = paths::get_meshkv_dir()?;
        let config_path = paths::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::in_dir(home));
        }

        let mut config = Self::load_from(&config_path)?;
        if config.path.is_relative() {
            config.path = home.join(&config.path);
        }
        if config.index_path.is_relative() {
            config.index_path = home.join(&config.index_path);
        }
        Ok(config)
    }

    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields have invalid types or are unknown
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: KvConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error listing every problem found:
    /// - Empty store paths
    /// - Primary and index stores pointing at the same file
    /// - Zero cache size, or one above [`constants::MAX_CACHE_SIZE`]
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push("path cannot be empty".to_string());
        }

        if self.index_path.as_os_str().is_empty() {
            errors.push("index_path cannot be empty".to_string());
        }

        if !self.path.as_os_str().is_empty() && self.path == self.index_path {
            errors.push(format!(
                "path and index_path must be different files (both are '{}')",
                self.path.display()
            ));
        }

        if self.cache_size == 0 {
            errors.push(format!(
                "cache_size cannot be 0. Set a positive number (default: {})",
                constants::DEFAULT_CACHE_SIZE
            ));
        }

        if self.cache_size > constants::MAX_CACHE_SIZE {
            errors.push(format!(
                "cache_size {} exceeds the maximum of {}",
                self.cache_size,
                constants::MAX_CACHE_SIZE
            ));
        } else if self.cache_size > constants::MAX_RECOMMENDED_CACHE_SIZE {
            warnings.push(format!(
                "cache_size {} is very high (> {})\n  \
                 Every cached value is held decoded in memory",
                self.cache_size,
                constants::MAX_RECOMMENDED_CACHE_SIZE
            ));
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}
