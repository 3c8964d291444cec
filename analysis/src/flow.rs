//! Pre-execution checks and post-run analysis around an external test run.
//!
//! [`FlowOrchestrator`] composes the duplication checker and the failure
//! analyzer. [`PipelineRun`] records where one run is in the
//! `INIT -> PRECHECK -> READY|BLOCKED -> ANALYZED -> DONE` sequence and
//! refuses any other transition. `BLOCKED` is advisory: a blocked run may
//! still be analyzed.

use std::fmt;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use suite_triage_core::{ArtifactKind, FailureAnalysis, PreCheckReport, REPORT_CONTRACT_VERSION};
use tracing::{info, warn};

use crate::discover::{ArtifactSource, DiscoverError};
use crate::duplication::DuplicationChecker;
use crate::failure::{FailureAnalyzer, OutputAnalysis};
use crate::runner::{BuildSummary, RunnerError, RunnerOutput, TestRunner};

/// Phase of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowState {
    Init,
    Precheck,
    Ready,
    Blocked,
    Analyzed,
    Done,
}

impl FlowState {
    /// Returns `true` if `next` directly follows `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use suite_triage_analysis::flow::FlowState;
    ///
    /// assert!(FlowState::Blocked.can_advance_to(FlowState::Analyzed));
    /// assert!(!FlowState::Ready.can_advance_to(FlowState::Precheck));
    /// ```
    pub fn can_advance_to(self, next: FlowState) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Precheck)
                | (Self::Precheck, Self::Ready)
                | (Self::Precheck, Self::Blocked)
                | (Self::Ready, Self::Analyzed)
                | (Self::Blocked, Self::Analyzed)
                | (Self::Analyzed, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Precheck => "PRECHECK",
            Self::Ready => "READY",
            Self::Blocked => "BLOCKED",
            Self::Analyzed => "ANALYZED",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed error for orchestrated runs.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("invalid transition {from} -> {to}")]
    InvalidTransition { from: FlowState, to: FlowState },

    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// State and results of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub state: FlowState,
    /// Every state entered, starting with `INIT`.
    pub history: Vec<FlowState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precheck: Option<PreCheckReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_output: Option<OutputAnalysis>,
    /// Whether the external test run succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests_passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            state: FlowState::Init,
            history: vec![FlowState::Init],
            precheck: None,
            build: None,
            test_output: None,
            tests_passed: None,
            exit_code: None,
        }
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidTransition`] and leaves the run untouched
    /// when `next` does not directly follow the current state.
    pub fn advance(&mut self, next: FlowState) -> Result<(), FlowError> {
        if !self.state.can_advance_to(next) {
            return Err(FlowError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Closes an analyzed run.
    pub fn finish(&mut self) -> Result<(), FlowError> {
        self.advance(FlowState::Done)
    }

    pub fn is_blocked(&self) -> bool {
        self.history.contains(&FlowState::Blocked)
    }
}

/// Sequences duplication pre-checks and failure analysis for one project.
///
/// # Examples
///
/// ```
/// use suite_triage_analysis::discover::MemoryArtifactSource;
/// use suite_triage_analysis::flow::FlowOrchestrator;
/// use suite_triage_core::SourceArtifact;
///
/// let source = MemoryArtifactSource::default()
///     .with_page(SourceArtifact::loaded(
///         "LoginPage.java",
///         r#"public static final By A = By.id("x");"#,
///     ))
///     .with_page(SourceArtifact::loaded(
///         "HomePage.java",
///         r#"public static final By B = By.id("x");"#,
///     ));
///
/// let report = FlowOrchestrator::new(source).check_before_execution().unwrap();
/// assert!(!report.ready_to_execute);
/// assert_eq!(report.issues, vec!["Duplicate locators found: 1"]);
/// ```
#[derive(Debug, Clone)]
pub struct FlowOrchestrator<S: ArtifactSource> {
    source: S,
    checker: DuplicationChecker,
    analyzer: FailureAnalyzer,
}

impl<S: ArtifactSource> FlowOrchestrator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            checker: DuplicationChecker::default(),
            analyzer: FailureAnalyzer::default(),
        }
    }

    pub fn with_checker(mut self, checker: DuplicationChecker) -> Self {
        self.checker = checker;
        self
    }

    pub fn with_analyzer(mut self, analyzer: FailureAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn checker(&self) -> &DuplicationChecker {
        &self.checker
    }

    pub fn analyzer(&self) -> &FailureAnalyzer {
        &self.analyzer
    }

    /// Runs both duplication checks over the discovered artifacts.
    ///
    /// Locator duplicates clear `ready_to_execute`. Step duplicates are only
    /// listed in `issues`.
    pub fn check_before_execution(&self) -> Result<PreCheckReport, DiscoverError> {
        let pages = self.source.discover(ArtifactKind::Pages)?;
        let steps = self.source.discover(ArtifactKind::Steps)?;

        let duplication_check = self.checker.check_locator_duplication(&pages);
        let step_integrity = self.checker.check_step_duplication(&steps);

        let mut ready_to_execute = true;
        let mut issues = Vec::new();
        if duplication_check.has_duplicates() {
            ready_to_execute = false;
            issues.push(format!(
                "Duplicate locators found: {}",
                duplication_check.duplicate_groups.len()
            ));
        }
        if step_integrity.has_duplicates() {
            issues.push(format!(
                "Duplicate steps found: {}",
                step_integrity.duplicate_groups.len()
            ));
        }

        if ready_to_execute {
            info!(issues = issues.len(), "Pre-execution checks passed");
        } else {
            warn!(issues = ?issues, "Pre-execution checks found blocking issues");
        }

        Ok(PreCheckReport {
            report_version: REPORT_CONTRACT_VERSION.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            duplication_check,
            step_integrity,
            ready_to_execute,
            issues,
        })
    }

    /// Runs the pre-check for `run`, leaving it in `READY` or `BLOCKED`.
    pub fn precheck<'a>(&self, run: &'a mut PipelineRun) -> Result<&'a PreCheckReport, FlowError> {
        run.advance(FlowState::Precheck)?;
        let report = self.check_before_execution()?;
        let next = if report.ready_to_execute {
            FlowState::Ready
        } else {
            FlowState::Blocked
        };
        run.advance(next)?;
        Ok(run.precheck.insert(report))
    }

    /// Dedup suggestions for every report in `precheck` that has duplicates.
    pub fn suggestions(&self, precheck: &PreCheckReport) -> Vec<String> {
        [&precheck.duplication_check, &precheck.step_integrity]
            .into_iter()
            .filter(|report| report.has_duplicates())
            .flat_map(|report| self.checker.suggest_deduplication(report))
            .collect()
    }

    pub fn analyze_test_failure(&self, log_text: &str) -> FailureAnalysis {
        self.analyzer.analyze_failure(log_text)
    }

    pub fn analyze_test_output(&self, output: &str) -> OutputAnalysis {
        self.analyzer.analyze_test_output(output)
    }

    /// Records the external test run's output on `run` and moves it to
    /// `ANALYZED`.
    pub fn record_run_output(
        &self,
        run: &mut PipelineRun,
        output: &RunnerOutput,
    ) -> Result<(), FlowError> {
        run.advance(FlowState::Analyzed)?;
        let combined = output.combined();
        run.build = Some(BuildSummary::parse(&combined));
        run.test_output = Some(self.analyzer.analyze_test_output(&combined));
        run.tests_passed = Some(output.success());
        run.exit_code = output.exit_code;
        info!(
            passed = output.success(),
            timed_out = output.timed_out,
            "Recorded test run output"
        );
        Ok(())
    }

    /// Pre-check, external test run, analysis, done.
    ///
    /// A blocked pre-check does not stop the run; inspect
    /// [`PipelineRun::is_blocked`] to act on it.
    pub fn execute<R: TestRunner>(&self, runner: &R, root: &Path) -> Result<PipelineRun, FlowError> {
        let mut run = PipelineRun::new();
        self.precheck(&mut run)?;
        if run.state == FlowState::Blocked {
            warn!("Continuing test run despite blocked pre-check");
        }
        let output = runner.run(root)?;
        self.record_run_output(&mut run, &output)?;
        run.finish()?;
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use suite_triage_core::SourceArtifact;

    use super::*;
    use crate::discover::MemoryArtifactSource;

    struct FakeRunner(RunnerOutput);

    impl TestRunner for FakeRunner {
        fn run(&self, _root: &Path) -> Result<RunnerOutput, RunnerError> {
            Ok(self.0.clone())
        }
    }

    fn page(path: &str, name: &str, selector: &str) -> SourceArtifact {
        SourceArtifact::loaded(
            path,
            format!("public static final By {name} = By.id(\"{selector}\");"),
        )
    }

    fn step(path: &str, text: &str) -> SourceArtifact {
        SourceArtifact::loaded(path, format!("@When(\"{text}\")"))
    }

    #[test]
    fn test_clean_project_is_ready() {
        let source = MemoryArtifactSource::default()
            .with_page(page("A.java", "A", "a"))
            .with_page(page("B.java", "B", "b"));
        let report = FlowOrchestrator::new(source).check_before_execution().unwrap();
        assert!(report.ready_to_execute);
        assert!(report.issues.is_empty());
        assert_eq!(report.report_version, REPORT_CONTRACT_VERSION);
    }

    #[test]
    fn test_step_duplicates_do_not_block() {
        let source = MemoryArtifactSource::default()
            .with_step(step("LoginSteps.java", "user logs in"))
            .with_step(step("CommonSteps.java", "User logs in"));
        let report = FlowOrchestrator::new(source).check_before_execution().unwrap();
        assert!(report.ready_to_execute);
        assert_eq!(report.issues, vec!["Duplicate steps found: 1"]);
    }

    #[test]
    fn test_empty_project_reports_both_checks() {
        let report = FlowOrchestrator::new(MemoryArtifactSource::default())
            .check_before_execution()
            .unwrap();
        assert!(report.ready_to_execute);
        assert_eq!(report.duplication_check.total_count, 0);
        assert_eq!(report.step_integrity.total_count, 0);
    }

    #[test]
    fn test_transitions_are_one_directional() {
        let mut run = PipelineRun::new();
        assert!(matches!(
            run.advance(FlowState::Analyzed),
            Err(FlowError::InvalidTransition {
                from: FlowState::Init,
                to: FlowState::Analyzed
            })
        ));
        run.advance(FlowState::Precheck).unwrap();
        run.advance(FlowState::Ready).unwrap();
        assert!(run.advance(FlowState::Blocked).is_err());
        assert!(run.advance(FlowState::Precheck).is_err());
        assert_eq!(run.state, FlowState::Ready);
    }

    #[test]
    fn test_finish_requires_analysis() {
        let mut run = PipelineRun::new();
        assert!(run.finish().is_err());
    }

    #[test]
    fn test_blocked_run_still_executes() {
        let source = MemoryArtifactSource::default()
            .with_page(page("A.java", "A", "dup"))
            .with_page(page("B.java", "B", "DUP"));
        let runner = FakeRunner(RunnerOutput {
            exit_code: Some(1),
            stdout: "[ERROR] org.openqa.selenium.TimeoutException: waited\n\
                     [INFO] Tests run: 2, Failures: 1, Errors: 0, Skipped: 0\n\
                     [INFO] BUILD FAILURE"
                .to_string(),
            ..RunnerOutput::default()
        });

        let run = FlowOrchestrator::new(source)
            .execute(&runner, Path::new("."))
            .unwrap();
        assert_eq!(
            run.history,
            vec![
                FlowState::Init,
                FlowState::Precheck,
                FlowState::Blocked,
                FlowState::Analyzed,
                FlowState::Done
            ]
        );
        assert!(run.is_blocked());
        assert_eq!(run.tests_passed, Some(false));
        assert_eq!(run.exit_code, Some(1));
        assert_eq!(run.build.as_ref().unwrap().failures, Some(1));
        let output = run.test_output.as_ref().unwrap();
        assert_eq!(output.failure_line_count, 1);
    }

    #[test]
    fn test_suggestions_cover_only_duplicated_kinds() {
        let source = MemoryArtifactSource::default()
            .with_step(step("A.java", "x"))
            .with_step(step("B.java", "x"));
        let orchestrator = FlowOrchestrator::new(source);
        let report = orchestrator.check_before_execution().unwrap();
        let suggestions = orchestrator.suggestions(&report);
        assert_eq!(suggestions[0], "=== STEP DEDUPLICATION SUGGESTIONS ===");
        assert!(!suggestions.iter().any(|s| s.contains("LOCATOR")));
    }

    #[test]
    fn test_state_serializes_screaming_case() {
        let json = serde_json::to_string(&FlowState::Blocked).unwrap();
        assert_eq!(json, "\"BLOCKED\"");
    }
}
