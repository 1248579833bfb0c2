//! Application configuration, loaded from a TOML file.
//!
//! A handful of settings live outside the workbook entirely because the
//! domain rules explicitly defer them to a human: the target academic
//! year, the CORE-exam block, and the soft-objective weight balancing
//! preference rank against historical-deficit pressure in the R2 matcher.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub scheduling: SchedulingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingSettings {
    /// The academic year the built schedule starts in (July 1 of this
    /// year through June 30 of the next).
    pub target_year: i32,
    /// The block, externally configured per year, before which Learning
    /// Center must land and which gates the post-CORE night-float layer.
    /// There is no sane default — this must always come from config.
    pub core_exam_block: u32,
    /// Weight on the historical-deficit penalty term in the R2 matcher's
    /// objective, relative to preference rank (which is always weight 1).
    /// Kept small enough that rank dominates.
    #[serde(default = "default_deficit_weight")]
    pub deficit_weight: f64,
}

fn default_deficit_weight() -> f64 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            SchedulerError::data_integrity(format!(
                "failed to read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SchedulerError> {
        toml::from_str(content)
            .map_err(|e| SchedulerError::data_integrity(format!("failed to parse config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deficit_weight_defaults_when_omitted() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [scheduling]
            target_year = 2025
            core_exam_block = 6
            "#,
        )
        .unwrap();
        assert_eq!(cfg.scheduling.deficit_weight, 0.1);
    }

    #[test]
    fn missing_core_exam_block_is_rejected_not_guessed() {
        let err = AppConfig::from_toml_str(
            r#"
            [scheduling]
            target_year = 2025
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SchedulerError::DataIntegrity { .. }));
    }

    #[test]
    fn logging_filter_defaults_to_info() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [scheduling]
            target_year = 2025
            core_exam_block = 6
            "#,
        )
        .unwrap();
        assert_eq!(cfg.logging.filter, "info");
    }
}
