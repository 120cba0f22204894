use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use bookdoum_core::{DEFAULT_CATEGORIES, DEFAULT_DISPLAY_COLUMNS, DEFAULT_POLL_INTERVAL};
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG: &str = "bookdoum.yaml";
pub const DEFAULT_SOURCE: &str = "북돋움관리대장.xlsx";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = DEFAULT_POLL_INTERVAL.as_millis() as u64;

const ENV_SOURCE: &str = "BOOKDOUM_SOURCE";
const ENV_POLL_MS: &str = "BOOKDOUM_POLL_MS";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub source_path: PathBuf,
    pub poll_interval_ms: u64,
    pub display_columns: Vec<String>,
    pub categories: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            display_columns: to_strings(DEFAULT_DISPLAY_COLUMNS),
            categories: to_strings(DEFAULT_CATEGORIES),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl SearchConfig {
    /// Defaults, then the YAML file, then the environment, then `--source`.
    ///
    /// An explicitly named config file must exist; the default one is only
    /// read when present.
    pub fn load(config_path: Option<&Path>, source_override: Option<PathBuf>) -> Result<Self> {
        let default_path = Path::new(DEFAULT_CONFIG);
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None if default_path.exists() => Self::from_file(default_path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        if let Some(source) = source_override {
            config.source_path = source;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(source) = lookup(ENV_SOURCE).filter(|value| !value.trim().is_empty()) {
            self.source_path = PathBuf::from(source.trim());
        }
        if let Some(raw) = lookup(ENV_POLL_MS) {
            match raw.trim().parse() {
                Ok(value) => self.poll_interval_ms = value,
                Err(_) => warn!(value = %raw, "ignoring unparsable {}", ENV_POLL_MS),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be greater than zero"));
        }
        if self.display_columns.is_empty() {
            return Err(anyhow!("display_columns must list at least one column"));
        }
        if self.categories.is_empty() {
            return Err(anyhow!("categories must list at least one field"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
