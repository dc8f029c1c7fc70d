//! Logger configuration.
//!
//! All fields have defaults, so `LoggerConfig::default()` is the usual
//! production path; a TOML file can override the default minimum level, seed
//! per-source levels, or rename the index record:
//!
//! ```toml
//! default_level = "info"
//! index_file = "index.txt"
//!
//! [levels]
//! "robot::drive" = "debug"
//! "robot::intake" = "error"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{LogError, Result};
use crate::level::Level;

/// Configuration for [`LoggerContext`](crate::LoggerContext).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    /// Minimum level for sources not listed in `levels`.
    pub default_level: Level,
    /// Per-source minimum levels seeded into the registry at construction.
    pub levels: BTreeMap<String, Level>,
    /// File name of the session index record at the storage root.
    pub index_file: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            default_level: Level::DEFAULT,
            levels: BTreeMap::new(),
            index_file: "index.txt".to_owned(),
        }
    }
}

impl LoggerConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| LogError::Config(err.to_string()))
    }

    /// Loads a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.default_level, Level::Warn);
        assert!(config.levels.is_empty());
        assert_eq!(config.index_file, "index.txt");
    }

    #[test]
    fn test_parse_toml() {
        let config = LoggerConfig::from_toml_str(
            r#"
            default_level = "info"

            [levels]
            "robot::drive" = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_level, Level::Info);
        assert_eq!(config.levels.get("robot::drive"), Some(&Level::Debug));
        assert_eq!(config.index_file, "index.txt");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = LoggerConfig::from_toml_str("log_dir = \"/usd\"").unwrap_err();
        assert!(matches!(err, LogError::Config(_)));
    }
}
