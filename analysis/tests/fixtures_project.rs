use std::fs;
use std::path::{Path, PathBuf};

use suite_triage_analysis::discover::{ArtifactSource, FsArtifactSource};
use suite_triage_analysis::duplication::restrict_to_module;
use suite_triage_analysis::failure::FailureAnalyzer;
use suite_triage_analysis::flow::{FlowOrchestrator, FlowState};
use suite_triage_analysis::runner::{BuildSummary, RunnerError, RunnerOutput, TestRunner};
use suite_triage_core::{ArtifactKind, ArtifactLayout, Severity};

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/project")
}

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}

fn source() -> FsArtifactSource {
    FsArtifactSource::new(fixture_root(), ArtifactLayout::default()).expect("fixture root exists")
}

struct LogRunner(String);

impl TestRunner for LogRunner {
    fn run(&self, _root: &Path) -> Result<RunnerOutput, RunnerError> {
        Ok(RunnerOutput {
            exit_code: Some(1),
            stdout: self.0.clone(),
            ..RunnerOutput::default()
        })
    }
}

#[test]
fn test_discovery_follows_default_layout() {
    let pages = source().discover(ArtifactKind::Pages).unwrap();
    let names: Vec<String> = pages
        .iter()
        .map(|a| a.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["CheckoutPage.java", "LoginPage.java"]);

    let steps = source().discover(ArtifactKind::Steps).unwrap();
    assert_eq!(steps.len(), 2);
}

#[test]
fn test_precheck_on_fixture_project_blocks_on_locators() {
    let report = FlowOrchestrator::new(source())
        .check_before_execution()
        .unwrap();

    let locators = &report.duplication_check;
    assert_eq!(locators.total_count, 7);
    assert_eq!(locators.skipped_lines, 1);
    assert_eq!(locators.duplicate_groups.len(), 1);
    assert_eq!(locators.duplicate_groups[0].normalized_key, r#"by.id("login-button")"#);
    let members: Vec<&str> = locators.duplicate_groups[0]
        .occurrences
        .iter()
        .map(|o| o.name.as_str())
        .collect();
    assert_eq!(members, vec!["SUBMIT_BTN", "LOGIN_BUTTON"]);
    assert!((locators.duplication_percentage - 100.0 / 7.0).abs() < 1e-9);

    let steps = &report.step_integrity;
    assert_eq!(steps.total_count, 5);
    assert_eq!(steps.duplicate_groups.len(), 1);
    assert_eq!(steps.duplication_percentage, 20.0);

    assert!(!report.ready_to_execute);
    assert_eq!(
        report.issues,
        vec!["Duplicate locators found: 1", "Duplicate steps found: 1"]
    );
}

#[test]
fn test_twenty_percent_is_not_high_duplication() {
    let orchestrator = FlowOrchestrator::new(source());
    let report = orchestrator.check_before_execution().unwrap();
    let suggestions = orchestrator.suggestions(&report);
    assert!(suggestions.iter().any(|s| s == "Found 1 duplicate step definitions"));
    assert!(!suggestions.iter().any(|s| s.starts_with("HIGH DUPLICATION")));
}

#[test]
fn test_module_restriction_on_fixture_project() {
    let src = source();
    let report = FlowOrchestrator::new(src.clone())
        .check_before_execution()
        .unwrap()
        .duplication_check;
    let pages_dir = src.dir_for(ArtifactKind::Pages);

    let checkout = restrict_to_module(&report, &pages_dir.join("checkout"));
    assert_eq!(checkout.duplicate_groups.len(), 1);

    let elsewhere = restrict_to_module(&report, &pages_dir.join("inventory"));
    assert!(!elsewhere.has_duplicates());
    assert_eq!(elsewhere.duplication_percentage, 0.0);
}

#[test]
fn test_surefire_log_analysis() {
    let log = fixture("surefire-failure.log");
    let summary = BuildSummary::parse(&log);
    assert!(!summary.build_success);
    assert_eq!(summary.tests_run, Some(3));
    assert_eq!(summary.failures, Some(1));
    assert_eq!(summary.errors, Some(1));

    let analysis = FailureAnalyzer::default().analyze_test_output(&log);
    assert_eq!(analysis.failure_line_count, 5);
    assert_eq!(analysis.analyzed.len(), 3);
    let classified = &analysis.analyzed[2].analysis;
    assert_eq!(classified.error_type.as_deref(), Some("NoSuchElementException"));
    assert_eq!(classified.severity, Severity::Critical);
}

#[test]
fn test_whole_log_classification() {
    let log = fixture("surefire-failure.log");
    let analysis = FailureAnalyzer::default().analyze_failure(&log);
    assert_eq!(analysis.error_type.as_deref(), Some("NoSuchElementException"));
    assert_eq!(analysis.severity, Severity::Critical);
    assert_eq!(analysis.recommended_actions.len(), 4);
}

#[test]
fn test_pipeline_over_fixture_project() {
    let runner = LogRunner(fixture("surefire-failure.log"));
    let run = FlowOrchestrator::new(source())
        .execute(&runner, &fixture_root())
        .unwrap();
    assert_eq!(run.state, FlowState::Done);
    assert!(run.is_blocked());
    assert_eq!(run.tests_passed, Some(false));
    assert_eq!(run.build.unwrap().tests_run, Some(3));
}
