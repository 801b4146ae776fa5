//! Path utilities for meshkv data.
//!
//! - [`get_meshkv_dir`] - `~/.meshkv/` (base directory)
//! - [`get_config_path`] - `~/.meshkv/meshkv.toml`
//! - [`get_primary_path`] - `~/.meshkv/meshkv.redb`
//! - [`get_index_path`] - `~/.meshkv/meshkv_index.redb`

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::constants;

/// Get the meshkv base directory.
///
/// Resolution order:
/// 1. `MESHKV_HOME` environment variable (if set and non-empty)
/// 2. `~/.meshkv/` (default)
pub fn get_meshkv_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(constants::HOME_ENV_VAR)
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }

    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(".meshkv"))
}

/// Get the config file path: `~/.meshkv/meshkv.toml`
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_meshkv_dir()?.join(constants::DEFAULT_CONFIG_FILE))
}

/// Get the primary store path: `~/.meshkv/meshkv.redb`
pub fn get_primary_path() -> Result<PathBuf> {
    Ok(get_meshkv_dir()?.join(constants::DEFAULT_PRIMARY_FILE))
}

/// Get the index store path: `~/.meshkv/meshkv_index.redb`
pub fn get_index_path() -> Result<PathBuf> {
    Ok(get_meshkv_dir()?.join(constants::DEFAULT_INDEX_FILE))
}
