use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::common::errors::SweepError;
use crate::scanner::patterns::ArtifactPattern;
use crate::scanner::rank;

/// Global SpaceSweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How many ranked entries to show (clamped to 10..=500)
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,

    /// Size floor in KB for patterns that don't declare their own
    #[serde(default = "default_min_size_kb")]
    pub default_min_size_kb: u64,

    /// How many member paths the confirmation prompt previews
    #[serde(default = "default_preview_items")]
    pub preview_items: usize,

    /// Optional walk depth limit (unlimited when absent)
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Paths to exclude from scanning
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Extra artifact patterns appended to the built-in catalog
    #[serde(default)]
    pub extra_patterns: Vec<ArtifactPattern>,

    /// Output format preference
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Quiet,
}

fn default_display_limit() -> usize {
    50
}
fn default_min_size_kb() -> u64 {
    100
}
fn default_preview_items() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_limit: default_display_limit(),
            default_min_size_kb: default_min_size_kb(),
            preview_items: default_preview_items(),
            max_depth: None,
            exclude_paths: Vec::new(),
            extra_patterns: Vec::new(),
            output_format: OutputFormat::Human,
        }
    }
}

impl Config {
    /// Get the SpaceSweep data directory (~/.spacesweep)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".spacesweep")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Default location of the action log
    pub fn default_log_path() -> PathBuf {
        Self::logs_dir().join("spacesweep.log")
    }

    /// Load config from a specific file, or defaults if absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            config.display_limit = rank::clamp_display_limit(config.display_limit);
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Apply a `config set KEY VALUE` update. Counts are clamped, garbage is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SweepError> {
        let parse_err = |what: &str| SweepError::InvalidConfiguration {
            message: format!("'{}' is not a valid {} for {}", value, what, key),
        };

        match key {
            "display_limit" => {
                let n: usize = value.parse().map_err(|_| parse_err("count"))?;
                self.display_limit = rank::clamp_display_limit(n);
            }
            "default_min_size_kb" => {
                self.default_min_size_kb = value.parse().map_err(|_| parse_err("size"))?;
            }
            "preview_items" => {
                self.preview_items = value.parse().map_err(|_| parse_err("count"))?;
            }
            "max_depth" => {
                self.max_depth = if value == "none" {
                    None
                } else {
                    Some(value.parse().map_err(|_| parse_err("depth"))?)
                };
            }
            "exclude_paths" => {
                self.exclude_paths = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            "output_format" => {
                self.output_format = match value {
                    "human" => OutputFormat::Human,
                    "json" => OutputFormat::Json,
                    "quiet" => OutputFormat::Quiet,
                    _ => return Err(parse_err("format (human, json, quiet)")),
                };
            }
            _ => {
                return Err(SweepError::InvalidConfiguration {
                    message: format!("Unknown config key: {}", key),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clamps_display_limit() {
        let mut config = Config::default();
        config.set("display_limit", "5").unwrap();
        assert_eq!(config.display_limit, 10);
        config.set("display_limit", "9000").unwrap();
        assert_eq!(config.display_limit, 500);
    }

    #[test]
    fn test_set_rejects_garbage() {
        let mut config = Config::default();
        let err = config.set("display_limit", "lots").unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfiguration { .. }));
        assert!(config.set("no_such_key", "1").is_err());
    }

    #[test]
    fn test_set_max_depth() {
        let mut config = Config::default();
        config.set("max_depth", "4").unwrap();
        assert_eq!(config.max_depth, Some(4));
        config.set("max_depth", "none").unwrap();
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.display_limit, 50);
    }

    #[test]
    fn test_load_clamps_out_of_range_limit() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "display_limit = 3\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.display_limit, 10);
    }
}
