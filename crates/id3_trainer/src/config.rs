//! Trainer configuration file
//!
//! TOML layout:
//!
//! ```toml
//! [training]
//! depth_limit = 4
//! bin_count = 8
//! equal_frequency_binning = false
//! exterior_bins = true
//!
//! [training.feature_ranges]
//! temperature = [-40.0, 60.0]
//!
//! [logging]
//! level = "info"
//!
//! [sweep]
//! min_bins = 2
//! max_bins = 49
//! ```

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, Level};

use crate::errors::TrainerError;
use crate::trainer::TrainingParams;

/// Trainer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Tree and discretization settings
    pub training: TrainingParams,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Optional bin-count sweep
    pub sweep: Option<SweepConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Show the event target in log lines
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

/// Inclusive bin-count range to sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub min_bins: usize,
    pub max_bins: usize,
}

impl SweepConfig {
    pub fn range(&self) -> RangeInclusive<usize> {
        self.min_bins..=self.max_bins
    }
}

impl TrainerConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let config: TrainerConfig = toml::from_str(&content)
            .map_err(|e| TrainerError::Config(format!("Failed to parse config: {}", e)))?;
        config.log_level()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TrainerError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| TrainerError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Parsed logging level
    pub fn log_level(&self) -> Result<Level, TrainerError> {
        Level::from_str(&self.logging.level).map_err(|_| {
            TrainerError::Config(format!("Unknown log level `{}`", self.logging.level))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = TrainerConfig::default();
        assert_eq!(config.training, TrainingParams::default());
        assert_eq!(config.log_level().unwrap(), Level::INFO);
        assert!(config.sweep.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: TrainerConfig = toml::from_str(
            r#"
            [training]
            bin_count = 5
            exterior_bins = true

            [training.feature_ranges]
            temperature = [-40.0, 60.0]

            [sweep]
            min_bins = 2
            max_bins = 9
            "#,
        )
        .unwrap();

        assert_eq!(config.training.bin_count, Some(5));
        assert_eq!(config.training.depth_limit, None);
        assert!(config.training.exterior_bins);
        assert_eq!(
            config.training.feature_ranges.get("temperature"),
            Some(&(-40.0, 60.0))
        );
        assert_eq!(config.sweep.map(|s| s.range()), Some(2..=9));
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trainer.toml");

        let config = TrainerConfig {
            training: TrainingParams::default()
                .with_depth_limit(Some(3))
                .with_bin_count(Some(7))
                .with_feature_range("x", 0.0, 1.5),
            logging: LoggingConfig {
                level: "debug".to_string(),
                with_target: true,
            },
            sweep: None,
        };
        config.save_to_file(&path).unwrap();

        let loaded = TrainerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.log_level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trainer.toml");
        std::fs::write(&path, "[logging]\nlevel = \"loud\"\n").unwrap();

        assert!(matches!(
            TrainerConfig::load_from_file(&path),
            Err(TrainerError::Config(_))
        ));
        assert!(matches!(
            TrainerConfig::load_from_file(dir.path().join("missing.toml")),
            Err(TrainerError::Io(_))
        ));
    }
}
