//!
//! Configuration module
//!

use std::collections::HashMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILE_PREFIX: &str = "filedownloaded";
pub const DEFAULT_BUFFER_SIZE: usize = 10_000;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub download_dir: PathBuf,
    pub file_prefix: String,
    pub buffer_size: NonZeroUsize,
    // Create `download_dir` when it does not exist yet
    pub create_dir: bool,
    pub use_browser_user_agent: bool,
    pub headers: HashMap<String, String>,
}

impl Config {
    pub fn load_from_file(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref();
        let config_data = fs::read_to_string(file_path)
            .with_context(|| format!("Read config failed: {}", file_path.display()))?;
        let config: Config = serde_json::from_str(&config_data)
            .with_context(|| format!("Parse config failed: {}", file_path.display()))?;

        Ok(config)
    }

    /// `<config dir>/fetcher/config.json`
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("fetcher");
        path.push("config.json");

        Some(path)
    }

    /// Explicit file first, then the default location if it exists, then defaults
    pub fn load(file_path: Option<&Path>) -> Result<Self> {
        if let Some(file_path) = file_path {
            return Self::load_from_file(file_path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                debug!("Using config {}", path.display());
                Self::load_from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            buffer_size: NonZeroUsize::new(DEFAULT_BUFFER_SIZE).unwrap_or(NonZeroUsize::MIN),
            create_dir: true,
            use_browser_user_agent: false,
            headers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_fill_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "file_prefix": "grab", "headers": { "X-Token": "abc" } }"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();

        assert_eq!(config.file_prefix, "grab");
        assert_eq!(config.buffer_size.get(), DEFAULT_BUFFER_SIZE);
        assert!(config.create_dir);
        assert_eq!(config.headers.get("X-Token").map(String::as_str), Some("abc"));
    }

    #[test]
    fn should_reject_zero_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "buffer_size": 0 }"#).unwrap();

        assert!(Config::load_from_file(&path).is_err());
    }

    #[test]
    fn explicit_missing_file_should_fail() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");

        assert!(Config::load(Some(&missing)).is_err());
    }
}
