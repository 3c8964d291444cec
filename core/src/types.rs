//! Type definitions for declaration scanning and failure triage.
//!
//! This module defines the data model shared by the duplication checker, the
//! failure analyzer and the flow orchestrator. Every type is designed for
//! serialization with [`serde`]; field names are snake_case so the JSON shape
//! handed to HTTP and CLI callers matches the struct layout verbatim.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Version of the report contract (semver).
///
/// Embedded in every [`PreCheckReport`] so downstream consumers can detect
/// shape changes.
pub const REPORT_CONTRACT_VERSION: &str = "1.0.0";

/// Kind of declaration a [`DuplicationReport`] was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// `public static final By NAME = By.xxx(...);` fields in page objects.
    Locator,
    /// `@Given/@When/@Then("...")` annotations in step definitions.
    Step,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locator => write!(f, "locator"),
            Self::Step => write!(f, "step"),
        }
    }
}

/// Content of one source artifact as materialized by the caller.
///
/// The checker never touches the filesystem itself; read failures are carried
/// in here so they can be reported as side notes instead of aborting a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ArtifactContent {
    /// The file was read successfully.
    Loaded(String),
    /// The file does not exist. Skipped without a note.
    Missing,
    /// The file exists but could not be read (permissions, encoding, ...).
    Unreadable(String),
}

/// One source artifact: a path plus its (possibly failed) content.
///
/// # Examples
///
/// ```
/// use suite_triage_core::{ArtifactContent, SourceArtifact};
///
/// let artifact = SourceArtifact::loaded("pages/LoginPage.java", "class LoginPage {}");
/// assert_eq!(artifact.text(), Some("class LoginPage {}"));
///
/// let missing = SourceArtifact::missing("pages/Gone.java");
/// assert_eq!(missing.content, ArtifactContent::Missing);
/// assert!(missing.text().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceArtifact {
    pub path: PathBuf,
    pub content: ArtifactContent,
}

impl SourceArtifact {
    /// Creates an artifact whose content was read successfully.
    pub fn loaded(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: ArtifactContent::Loaded(content.into()),
        }
    }

    /// Creates an artifact for a file that does not exist.
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: ArtifactContent::Missing,
        }
    }

    /// Creates an artifact for a file that could not be read.
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: ArtifactContent::Unreadable(reason.into()),
        }
    }

    /// Returns the text when the artifact was loaded.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            ArtifactContent::Loaded(text) => Some(text),
            _ => None,
        }
    }
}

/// One locator declaration found in a page object.
///
/// Recomputed on every scan; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorEntry {
    pub file: PathBuf,
    /// Field name (e.g. `LOGIN_BUTTON`).
    pub name: String,
    /// Right-hand selector expression as written (e.g. `By.id("login-button")`).
    pub raw_value: String,
}

/// Cucumber step keyword of a step-definition annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKeyword {
    Given,
    When,
    Then,
}

impl StepKeyword {
    /// Parses an annotation name (`Given`, `When`, `Then`).
    ///
    /// # Examples
    ///
    /// ```
    /// use suite_triage_core::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::from_annotation("When"), Some(StepKeyword::When));
    /// assert_eq!(StepKeyword::from_annotation("And"), None);
    /// ```
    pub fn from_annotation(name: &str) -> Option<Self> {
        match name {
            "Given" => Some(Self::Given),
            "When" => Some(Self::When),
            "Then" => Some(Self::Then),
            _ => None,
        }
    }

    /// Returns the annotation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
        }
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step-definition annotation found in a step-definition class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    pub file: PathBuf,
    pub pattern_type: StepKeyword,
    /// Pattern text between the quotes, as written.
    pub pattern_text: String,
}

/// One member of a [`DuplicateGroup`].
///
/// For locators `name` is the field name; for steps it is the step keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub file: PathBuf,
    pub name: String,
}

impl Occurrence {
    /// Renders the occurrence as `file::name`.
    pub fn location(&self) -> String {
        format!("{}::{}", self.file.display(), self.name)
    }
}

/// Declarations sharing one normalized value.
///
/// Only groups with more than one occurrence are ever reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub normalized_key: String,
    /// Occurrences in first-seen order.
    pub occurrences: Vec<Occurrence>,
}

impl DuplicateGroup {
    /// Number of declarations sharing the key.
    pub fn count(&self) -> usize {
        self.occurrences.len()
    }

    /// Returns `true` if any occurrence lives under `dir`.
    pub fn touches(&self, dir: &Path) -> bool {
        self.occurrences.iter().any(|o| o.file.starts_with(dir))
    }
}

/// Result of one duplication scan.
///
/// `duplication_percentage` is group based:
/// `100 * duplicate_groups.len() / total_count`, or `0.0` when nothing was
/// found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicationReport {
    pub kind: DeclarationKind,
    /// Number of declarations extracted across all artifacts.
    pub total_count: usize,
    pub duplicate_groups: Vec<DuplicateGroup>,
    /// Artifacts that contributed at least one declaration.
    pub affected_files: BTreeSet<PathBuf>,
    pub duplication_percentage: f64,
    /// Declaration-looking lines that did not parse and were skipped.
    #[serde(default)]
    pub skipped_lines: usize,
    /// Side notes for artifacts that could not be read.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_errors: Vec<String>,
}

impl DuplicationReport {
    /// Creates an empty report for `kind`.
    pub fn empty(kind: DeclarationKind) -> Self {
        Self {
            kind,
            total_count: 0,
            duplicate_groups: Vec::new(),
            affected_files: BTreeSet::new(),
            duplication_percentage: 0.0,
            skipped_lines: 0,
            read_errors: Vec::new(),
        }
    }

    /// Returns `true` if at least one duplicate group was found.
    pub fn has_duplicates(&self) -> bool {
        !self.duplicate_groups.is_empty()
    }

    /// Recomputes `duplication_percentage` from the group count and total.
    ///
    /// # Examples
    ///
    /// ```
    /// use suite_triage_core::{DeclarationKind, DuplicationReport};
    ///
    /// let mut report = DuplicationReport::empty(DeclarationKind::Locator);
    /// report.refresh_percentage();
    /// assert_eq!(report.duplication_percentage, 0.0);
    /// ```
    pub fn refresh_percentage(&mut self) {
        self.duplication_percentage = if self.total_count > 0 {
            100.0 * self.duplicate_groups.len() as f64 / self.total_count as f64
        } else {
            0.0
        };
    }
}

/// Severity bucket of a failure analysis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Canned action script for this severity.
    ///
    /// CRITICAL and HIGH each carry a four-step list; MEDIUM and LOW have
    /// none. The script depends on the bucket only, never on the matched
    /// signature.
    ///
    /// # Examples
    ///
    /// ```
    /// use suite_triage_core::Severity;
    ///
    /// assert_eq!(Severity::Critical.recommended_actions().len(), 4);
    /// assert!(Severity::Medium.recommended_actions().is_empty());
    /// ```
    pub fn recommended_actions(&self) -> &'static [&'static str] {
        match self {
            Self::Critical => &[
                "1. Verify locators are correct and up-to-date",
                "2. Check if page structure has changed",
                "3. Update page object with new locators",
                "4. Re-run test to verify fix",
            ],
            Self::High => &[
                "1. Increase timeout values",
                "2. Add explicit waits",
                "3. Check page load completeness",
                "4. Monitor for external delays",
            ],
            Self::Medium | Self::Low => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known error signature: a marker substring plus cause and fixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSignature {
    pub error_marker: String,
    pub cause: String,
    pub fixes: Vec<String>,
}

impl FailureSignature {
    pub fn new(error_marker: &str, cause: &str, fixes: &[&str]) -> Self {
        Self {
            error_marker: error_marker.to_string(),
            cause: cause.to_string(),
            fixes: fixes.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Classification of one failure log.
///
/// `error_type`, `cause` and `fixes` come from the first matching signature;
/// `severity` comes from an independent scan of the raw log. An unmatched log
/// is "unclassified", not an analyzer failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureAnalysis {
    pub error_type: Option<String>,
    pub cause: Option<String>,
    pub fixes: Vec<String>,
    pub severity: Severity,
    pub recommended_actions: Vec<String>,
}

impl FailureAnalysis {
    /// Returns `true` when a signature matched.
    pub fn is_classified(&self) -> bool {
        self.error_type.is_some()
    }
}

/// Outcome of the pre-execution duplication checks.
///
/// Locator duplicates clear `ready_to_execute`; step duplicates are recorded
/// in `issues` but never block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreCheckReport {
    pub report_version: String,
    /// RFC 3339 timestamp of when the check ran.
    pub timestamp: String,
    pub duplication_check: DuplicationReport,
    pub step_integrity: DuplicationReport,
    pub ready_to_execute: bool,
    pub issues: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serializes_screaming_case() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
        let back: Severity = serde_json::from_str("\"MEDIUM\"").unwrap();
        assert_eq!(back, Severity::Medium);
    }

    #[test]
    fn test_severity_display_matches_serde() {
        for severity in [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ] {
            let json = serde_json::to_string(&severity).unwrap();
            assert_eq!(json, format!("\"{severity}\""));
        }
    }

    #[test]
    fn test_high_actions_are_timeout_script() {
        let actions = Severity::High.recommended_actions();
        assert_eq!(actions[0], "1. Increase timeout values");
        assert_eq!(actions[3], "4. Monitor for external delays");
    }

    #[test]
    fn test_refresh_percentage_is_group_based() {
        let mut report = DuplicationReport::empty(DeclarationKind::Locator);
        report.total_count = 4;
        report.duplicate_groups.push(DuplicateGroup {
            normalized_key: "by.id(\"a\")".to_string(),
            occurrences: vec![
                Occurrence {
                    file: PathBuf::from("A.java"),
                    name: "A".to_string(),
                },
                Occurrence {
                    file: PathBuf::from("B.java"),
                    name: "B".to_string(),
                },
                Occurrence {
                    file: PathBuf::from("C.java"),
                    name: "C".to_string(),
                },
            ],
        });
        report.refresh_percentage();
        assert_eq!(report.duplication_percentage, 25.0);
    }

    #[test]
    fn test_report_omits_empty_read_errors() {
        let report = DuplicationReport::empty(DeclarationKind::Step);
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("read_errors"));
        assert!(json.contains("\"kind\":\"step\""));
    }

    #[test]
    fn test_unclassified_analysis_serializes_nulls() {
        let analysis = FailureAnalysis {
            error_type: None,
            cause: None,
            fixes: Vec::new(),
            severity: Severity::Low,
            recommended_actions: Vec::new(),
        };
        let value = serde_json::to_value(&analysis).unwrap();
        assert!(value["error_type"].is_null());
        assert!(value["cause"].is_null());
        assert_eq!(value["severity"], "LOW");
        assert!(!analysis.is_classified());
    }

    #[test]
    fn test_group_touches_directory() {
        let group = DuplicateGroup {
            normalized_key: "k".to_string(),
            occurrences: vec![Occurrence {
                file: PathBuf::from("pages/generated/LoginPage.java"),
                name: "USERNAME".to_string(),
            }],
        };
        assert!(group.touches(Path::new("pages/generated")));
        assert!(!group.touches(Path::new("pages/login")));
    }
}
