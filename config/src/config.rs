//! Triage configuration file.
//!
//! Every section is optional; anything left out falls back to the built-in
//! defaults, so an empty file is a valid configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! layout:
//!   pages_dir: src/main/java/org/example/pages
//!   steps_dir: src/test/java/org/example/stepdefinitions
//! duplication:
//!   high_duplication_threshold: 20.0
//! analysis:
//!   max_failure_lines: 3
//!   severity_rules:
//!     - marker: NoSuchElementException
//!       severity: CRITICAL
//! runner:
//!   command: [mvn, clean, verify]
//!   timeout_secs: 1800
//! ```

use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};
use suite_triage_core::{
    ArtifactLayout, SeverityRules, SignatureTable, validate_layout, validate_severity_rules,
    validate_signature_table,
};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Configuration format version written by [`TriageConfig::default`].
pub const CONFIG_VERSION: &str = "1.0";

/// Settings for the duplication checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicationConfig {
    /// Percentage above which suggestions escalate to a refactoring warning.
    pub high_duplication_threshold: f64,
}

impl Default for DuplicationConfig {
    fn default() -> Self {
        Self {
            high_duplication_threshold: 20.0,
        }
    }
}

/// Settings for the failure analyzer.
///
/// Absent tables mean "use the built-in tables".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Failure lines analyzed per test-run output.
    pub max_failure_lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signatures: Option<SignatureTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_rules: Option<SeverityRules>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_failure_lines: 3,
            signatures: None,
            severity_rules: None,
        }
    }
}

impl AnalysisConfig {
    /// Configured signature table, or the built-in one.
    pub fn signature_table(&self) -> SignatureTable {
        self.signatures.clone().unwrap_or_default()
    }

    /// Configured severity rules, or the built-in ones.
    pub fn severity_rules(&self) -> SeverityRules {
        self.severity_rules.clone().unwrap_or_default()
    }
}

/// External test-runner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Command line, program first.
    pub command: Vec<String>,
    /// Wall-clock limit for one run.
    pub timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: vec!["mvn".into(), "clean".into(), "verify".into()],
            timeout_secs: 1800,
        }
    }
}

/// Top-level configuration.
///
/// # Examples
///
/// ```
/// use suite_triage_config::TriageConfig;
///
/// let config: TriageConfig = serde_yaml::from_str("duplication:\n  high_duplication_threshold: 35\n").unwrap();
/// assert_eq!(config.duplication.high_duplication_threshold, 35.0);
/// assert_eq!(config.runner.command[0], "mvn");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub version: String,
    pub layout: ArtifactLayout,
    pub duplication: DuplicationConfig,
    pub analysis: AnalysisConfig,
    pub runner: RunnerConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            layout: ArtifactLayout::default(),
            duplication: DuplicationConfig::default(),
            analysis: AnalysisConfig::default(),
            runner: RunnerConfig::default(),
        }
    }
}

impl TriageConfig {
    /// Loads configuration from a YAML file.
    ///
    /// The result is not validated; call [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// or [`YamlError`](ConfigError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        // An empty file means "all defaults".
        let config = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&text)?
        };
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks tables and settings.
    ///
    /// # Errors
    ///
    /// Returns [`Invalid`](ConfigError::Invalid) with every table or layout
    /// problem, or [`InvalidSetting`](ConfigError::InvalidSetting) for the
    /// first out-of-range scalar.
    pub fn validate(&self) -> Result<()> {
        let mut errors = validate_layout(&self.layout);
        if let Some(ref signatures) = self.analysis.signatures {
            errors.extend(validate_signature_table(signatures));
        }
        if let Some(ref rules) = self.analysis.severity_rules {
            errors.extend(validate_severity_rules(rules));
        }
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        let threshold = self.duplication.high_duplication_threshold;
        if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::InvalidSetting {
                field: "duplication.high_duplication_threshold",
                reason: format!("{threshold} is not a percentage"),
            });
        }
        if self.analysis.max_failure_lines == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "analysis.max_failure_lines",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.runner.command.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidSetting {
                field: "runner.command",
                reason: "must name a program".to_string(),
            });
        }
        if self.runner.timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "runner.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use suite_triage_core::{FailureSignature, Severity, SeverityRule, ValidationError};

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TriageConfig::default().validate().is_ok());
    }

    #[test]
    fn test_absent_tables_fall_back_to_defaults() {
        let config = TriageConfig::default();
        assert_eq!(config.analysis.signature_table(), SignatureTable::default());
        assert_eq!(config.analysis.severity_rules(), SeverityRules::default());
    }

    #[test]
    fn test_yaml_tables_override_defaults() {
        let yaml = r#"
analysis:
  signatures:
    - error_marker: ElementClickInterceptedException
      cause: Another element receives the click
      fixes: [Close overlays first]
  severity_rules:
    - marker: ElementClickInterceptedException
      severity: HIGH
"#;
        let config: TriageConfig = serde_yaml::from_str(yaml).unwrap();
        let table = config.analysis.signature_table();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.signatures[0],
            FailureSignature::new(
                "ElementClickInterceptedException",
                "Another element receives the click",
                &["Close overlays first"]
            )
        );
        assert_eq!(
            config.analysis.severity_rules().rules,
            vec![SeverityRule::new("ElementClickInterceptedException", Severity::High)]
        );
        assert_eq!(config.analysis.max_failure_lines, 3);
    }

    #[test]
    fn test_validate_reports_table_errors() {
        let mut config = TriageConfig::default();
        config.analysis.severity_rules = Some(SeverityRules::new(vec![
            SeverityRule::new("X", Severity::High),
            SeverityRule::new("X", Severity::Low),
        ]));
        match config.validate() {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors, vec![ValidationError::DuplicateMarker("X".to_string())]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = TriageConfig::default();
        config.duplication.high_duplication_threshold = 150.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting {
                field: "duplication.high_duplication_threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_command() {
        let mut config = TriageConfig::default();
        config.runner.command.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting {
                field: "runner.command",
                ..
            })
        ));
    }
}
