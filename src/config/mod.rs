//! Configuration management module.
//!
//! Handles loading and saving converter settings from a JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "html_utf8_config.json";

/// Settings for the fixed-list converter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixedListConfig {
    #[serde(default = "default_directory")]
    pub directory: String,
    #[serde(default = "default_files")]
    pub files: Vec<String>,
}

/// Settings for the tree converter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeConfig {
    #[serde(default = "default_directory")]
    pub root: String,
    #[serde(default = "default_backup_dir_name")]
    pub backup_dir_name: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_decode_chain")]
    pub decode_chain: Vec<String>,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub fixed_list: FixedListConfig,
    #[serde(default)]
    pub tree: TreeConfig,
}

fn default_directory() -> String {
    ".".to_string()
}

fn default_files() -> Vec<String> {
    vec![
        "TITLE_PAGE.htm".to_string(),
        "CHAPTER_2_clean_stitched_formatted.htm".to_string(),
    ]
}

fn default_backup_dir_name() -> String {
    "_backup_before_utf8".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["htm".to_string(), "html".to_string()]
}

fn default_decode_chain() -> Vec<String> {
    vec![
        "UTF-8".to_string(),
        "windows-1252".to_string(),
        "ISO-8859-1".to_string(),
    ]
}

impl Default for FixedListConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            files: default_files(),
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root: default_directory(),
            backup_dir_name: default_backup_dir_name(),
            extensions: default_extensions(),
            decode_chain: default_decode_chain(),
        }
    }
}

/// Configuration manager for loading/saving config.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        let config_path = Self::get_exe_directory().join(CONFIG_FILE_NAME);
        Self { config_path }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Get the directory containing the executable.
    fn get_exe_directory() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the config file path.
    pub fn get_config_file_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file, falling back to defaults.
    pub fn load(&self) -> Config {
        let mut config = self.try_load().unwrap_or_default();

        // Set defaults if empty
        if config.fixed_list.directory.is_empty() {
            config.fixed_list.directory = default_directory();
        }
        if config.tree.root.is_empty() {
            config.tree.root = default_directory();
        }
        if config.tree.backup_dir_name.is_empty() {
            config.tree.backup_dir_name = default_backup_dir_name();
        }
        if config.tree.extensions.is_empty() {
            config.tree.extensions = default_extensions();
        }
        if config.tree.decode_chain.is_empty() {
            config.tree.decode_chain = default_decode_chain();
        }

        config
    }

    fn try_load(&self) -> Option<Config> {
        if !self.config_path.exists() {
            return None;
        }

        let content = fs::read_to_string(&self.config_path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Save configuration to file.
    pub fn save(&self, config: &Config) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        fs::write(&self.config_path, json)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
