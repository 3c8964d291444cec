//! Duplication checks and failure triage for generated UI test suites.
//!
//! This crate inspects generated page-object and step-definition sources for
//! duplicate declarations before a test run, and classifies failure output
//! after it.
//!
//! # Main entry points
//!
//! - [`check_locator_duplication`] / [`check_step_duplication`]: scan
//!   already-materialized artifacts with default settings.
//! - [`analyze_failure`]: classify one failure log with the default tables.
//! - [`flow::FlowOrchestrator`]: discover artifacts under a project root, run
//!   the pre-execution checks, drive a [`runner::TestRunner`] and analyze its
//!   output.
//!
//! # Example
//!
//! ```
//! use suite_triage_analysis::{analyze_failure, check_step_duplication};
//! use suite_triage_core::{Severity, SourceArtifact};
//!
//! let steps = vec![
//!     SourceArtifact::loaded("LoginSteps.java", r#"@Given("user is on {string}")"#),
//!     SourceArtifact::loaded("CartSteps.java", r#"@Given("User is on {string}")"#),
//! ];
//! let report = check_step_duplication(&steps);
//! assert_eq!(report.duplicate_groups.len(), 1);
//!
//! let analysis = analyze_failure("org.openqa.selenium.TimeoutException: timed out");
//! assert_eq!(analysis.severity, Severity::High);
//! ```
//!
//! The engine never writes files. Reads happen in [`discover`]; everything
//! else operates on in-memory content.

pub mod discover;
pub mod duplication;
pub mod extract;
pub mod failure;
pub mod flow;
pub mod output;
pub mod runner;

use suite_triage_core::{DuplicationReport, FailureAnalysis, SourceArtifact};

use duplication::DuplicationChecker;
use failure::FailureAnalyzer;

/// Scans page-object artifacts for duplicate locators with default settings.
pub fn check_locator_duplication(files: &[SourceArtifact]) -> DuplicationReport {
    DuplicationChecker::default().check_locator_duplication(files)
}

/// Scans step-definition artifacts for duplicate step patterns with default
/// settings.
pub fn check_step_duplication(files: &[SourceArtifact]) -> DuplicationReport {
    DuplicationChecker::default().check_step_duplication(files)
}

/// Classifies a failure log against the default signature and severity
/// tables.
///
/// # Examples
///
/// ```
/// use suite_triage_analysis::analyze_failure;
///
/// let analysis = analyze_failure("no known marker in here");
/// assert!(!analysis.is_classified());
/// ```
pub fn analyze_failure(log_text: &str) -> FailureAnalysis {
    FailureAnalyzer::default().analyze_failure(log_text)
}

/// Canned remediation snippet; see [`failure::suggest_fix_snippet`].
pub fn suggest_fix_snippet(error_type: &str, element_name: &str) -> String {
    failure::suggest_fix_snippet(error_type, element_name)
}
