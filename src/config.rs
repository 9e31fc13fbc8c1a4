//! Configuration loading and management
//!
//! Handles parsing of the optional `config.toml` in the data directory.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::storage::CONFIG_FILE;
use crate::task::{Category, Priority};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Defaults applied to new tasks
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Terminal UI settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Task-related configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TasksConfig {
    /// Category preselected for new tasks
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Priority preselected for new tasks
    #[serde(default = "default_priority")]
    pub default_priority: String,
}

fn default_category() -> String {
    Category::Personal.as_str().to_string()
}

fn default_priority() -> String {
    Priority::Medium.as_str().to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            default_priority: default_priority(),
        }
    }
}

impl TasksConfig {
    /// Falls back to the built-in default when the configured name is unknown.
    pub fn category(&self) -> Category {
        self.default_category.parse().unwrap_or_default()
    }

    pub fn priority(&self) -> Priority {
        self.default_priority.parse().unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        self.default_category.parse::<Category>().map_err(|_| {
            Error::InvalidConfig(format!(
                "tasks.default_category: unknown category '{}' (expected personal|work|shopping|health|other)",
                self.default_category
            ))
        })?;
        self.default_priority.parse::<Priority>().map_err(|_| {
            Error::InvalidConfig(format!(
                "tasks.default_priority: unknown priority '{}' (expected low|medium|high)",
                self.default_priority
            ))
        })?;
        Ok(())
    }
}

/// Terminal UI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    /// How long a transient notice stays visible
    #[serde(default = "default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,
}

fn default_notice_ttl_ms() -> u64 {
    3000
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notice_ttl_ms: default_notice_ttl_ms(),
        }
    }
}

impl UiConfig {
    fn validate(&self) -> Result<()> {
        if self.notice_ttl_ms == 0 {
            return Err(Error::InvalidConfig(
                "ui.notice_ttl_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config.toml` from the data directory, or return defaults when absent
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        self.tasks.validate()?;
        self.ui.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.tasks.default_category, "personal");
        assert_eq!(cfg.tasks.default_priority, "medium");
        assert_eq!(cfg.tasks.category(), Category::Personal);
        assert_eq!(cfg.tasks.priority(), Priority::Medium);
        assert_eq!(cfg.ui.notice_ttl_ms, 3000);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let content = r#"
[tasks]
default_category = "work"
default_priority = "high"

[ui]
notice_ttl_ms = 1500
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.tasks.category(), Category::Work);
        assert_eq!(cfg.tasks.priority(), Priority::High);
        assert_eq!(cfg.ui.notice_ttl_ms, 1500);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ui]\nnotice_ttl_ms = 500\n").expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.tasks.default_category, "personal");
        assert_eq!(cfg.ui.notice_ttl_ms, 500);
    }

    #[test]
    fn unknown_priority_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tasks]\ndefault_priority = \"urgent\"\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            Error::InvalidConfig(message) => assert!(message.contains("urgent")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_notice_ttl_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ui]\nnotice_ttl_ms = 0\n").expect("write config");

        assert!(matches!(
            Config::load(&path),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path()).expect("defaults");
        assert_eq!(cfg.ui.notice_ttl_ms, 3000);
    }
}
