//! Configuration for keiba-picks.

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::expander::Expander;

/// Inference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Minimum share of the race's stake a lone win-ticket pick must carry
    #[serde(default = "default_low_confidence_ratio")]
    pub low_confidence_ratio: f64,
}

fn default_low_confidence_ratio() -> f64 {
    0.15
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            low_confidence_ratio: default_low_confidence_ratio(),
        }
    }
}

/// Bet-number notation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotationConfig {
    #[serde(default = "default_group_separator")]
    pub group_separator: char,
    #[serde(default = "default_value_separator")]
    pub value_separator: char,
}

fn default_group_separator() -> char {
    '-'
}

fn default_value_separator() -> char {
    ','
}

impl Default for NotationConfig {
    fn default() -> Self {
        Self {
            group_separator: default_group_separator(),
            value_separator: default_value_separator(),
        }
    }
}

impl NotationConfig {
    pub fn expander(&self) -> Expander {
        Expander::new(self.group_separator, self.value_separator)
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub notation: NotationConfig,
}

impl AppConfig {
    /// Load configuration from environment and `config.*` in the working
    /// directory, or from `path` when given. An explicit path must exist.
    pub fn load_from(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            // Override with environment variables (KEIBA_INFERENCE__LOW_CONFIDENCE_RATIO, etc.)
            .add_source(
                config::Environment::with_prefix("KEIBA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let ratio = self.inference.low_confidence_ratio;
        ensure!(
            (0.0..=1.0).contains(&ratio),
            "inference.low_confidence_ratio must be within 0..=1, got {}",
            ratio
        );
        ensure!(
            self.notation.group_separator != self.notation.value_separator,
            "notation separators must differ, both are {:?}",
            self.notation.group_separator
        );
        for sep in [self.notation.group_separator, self.notation.value_separator] {
            ensure!(
                !sep.is_ascii_digit() && !sep.is_whitespace(),
                "notation separator {:?} is not usable",
                sep
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.inference.low_confidence_ratio, 0.15);
        assert_eq!(config.notation.group_separator, '-');
        assert_eq!(config.notation.value_separator, ',');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[inference]\nlow_confidence_ratio = 0.3\n\n[notation]\ngroup_separator = \"/\""
        )
        .unwrap();

        let config = AppConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.inference.low_confidence_ratio, 0.3);
        assert_eq!(config.notation.group_separator, '/');
        assert_eq!(config.notation.value_separator, ',');
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(AppConfig::load_from(Some(&path)).is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.inference.low_confidence_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.notation.value_separator = '-';
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.notation.group_separator = '3';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expander_uses_separators() {
        let notation = NotationConfig {
            group_separator: '/',
            value_separator: '.',
        };
        let bets = notation
            .expander()
            .expand(crate::ticket::TicketType::ExactaWheelOfFirst, "3/5.7")
            .unwrap();
        assert_eq!(bets.len(), 2);
    }
}
