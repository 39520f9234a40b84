use crate::core::stress::{MAX_PUTS_PER_WRITER, MAX_WRITERS};
use crate::utils::error::{Result, VersionedMapError};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 3] = ["compact", "text", "json"];
pub const MAX_INITIAL_CAPACITY: usize = 1 << 24;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub map: MapConfig,
    pub logging: LoggingConfig,
    pub stress: StressConfig,
    pub script: ScriptConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub initial_capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    pub writers: usize,
    pub puts_per_writer: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            writers: 50,
            puts_per_writer: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub stop_on_error: bool,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            stop_on_error: true,
        }
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(VersionedMapError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML after replacing `${VAR}` with the value of the environment variable.
    /// Unset variables are left as written.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| VersionedMapError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::from_name(&self.logging.format).unwrap_or_default()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.level.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_one_of("logging.format", &self.logging.format, &LOG_FORMATS)?;
        if let Some(level) = &self.logging.level {
            validation::validate_one_of("logging.level", level, &LOG_LEVELS)?;
        }

        validation::validate_range(
            "map.initial_capacity",
            self.map.initial_capacity,
            0,
            MAX_INITIAL_CAPACITY,
        )?;
        validation::validate_range("stress.writers", self.stress.writers, 1, MAX_WRITERS)?;
        validation::validate_range(
            "stress.puts_per_writer",
            self.stress.puts_per_writer,
            1,
            MAX_PUTS_PER_WRITER,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.stress.writers, 50);
        assert!(config.script.stop_on_error);
        assert_eq!(config.log_format(), LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_fill_in_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [stress]
            writers = 8

            [logging]
            format = "json"
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.stress.writers, 8);
        assert_eq!(config.stress.puts_per_writer, 100);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.log_level(), Some("debug"));
        assert_eq!(config.map.initial_capacity, 64);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("VERSIONED_MAP_TEST_WRITERS", "12");
        let config = TomlConfig::from_toml_str(
            r#"
            [stress]
            writers = ${VERSIONED_MAP_TEST_WRITERS}
            "#,
        )
        .unwrap();
        assert_eq!(config.stress.writers, 12);
    }

    #[test]
    fn test_unset_env_var_is_left_in_place() {
        let config = TomlConfig::from_toml_str(
            r#"
            [logging]
            level = "${VERSIONED_MAP_TEST_UNSET_LEVEL}"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level(), Some("${VERSIONED_MAP_TEST_UNSET_LEVEL}"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[stress\nwriters = 1").unwrap_err();
        assert!(matches!(err, VersionedMapError::ConfigError { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TomlConfig::default();
        config.stress.writers = 0;
        assert!(config.validate().is_err());

        let mut config = TomlConfig::default();
        config.stress.puts_per_writer = 0;
        assert!(config.validate().is_err());

        let mut config = TomlConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_values() {
        let config = TomlConfig::from_toml_str(
            "[map]\ninitial_capacity = 9223372036854775807\n",
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, VersionedMapError::InvalidConfigValueError { ref field, .. } if field == "map.initial_capacity")
        );

        let config = TomlConfig::from_toml_str(
            "[stress]\nputs_per_writer = 9223372036854775807\n",
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, VersionedMapError::InvalidConfigValueError { ref field, .. } if field == "stress.puts_per_writer")
        );
    }
}
