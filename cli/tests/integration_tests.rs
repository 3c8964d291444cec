use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const PAGES: &str = "src/main/java/org/example/pages";
const STEPS: &str = "src/test/java/org/example/stepdefinitions";

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_suite-triage"))
}

fn run(args: &[&str]) -> Output {
    bin().args(args).output().expect("failed to run suite-triage")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

fn locator(name: &str, selector: &str) -> String {
    format!("    public static final By {name} = By.id(\"{selector}\");\n")
}

/// Project whose login and checkout pages share one locator.
fn duplicated_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        &format!("{PAGES}/login/LoginPage.java"),
        &format!(
            "public class LoginPage {{\n{}{}}}\n",
            locator("USERNAME", "user-name"),
            locator("LOGIN_BUTTON", "login-button")
        ),
    );
    write(
        dir.path(),
        &format!("{PAGES}/checkout/CheckoutPage.java"),
        &format!(
            "public class CheckoutPage {{\n{}{}}}\n",
            locator("SUBMIT", "login-button"),
            locator("FIRST_NAME", "first-name")
        ),
    );
    write(
        dir.path(),
        &format!("{STEPS}/LoginSteps.java"),
        "@Given(\"user is on the login page\")\npublic void open() {}\n",
    );
    dir
}

fn clean_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        &format!("{PAGES}/HomePage.java"),
        &locator("LOGO", "logo"),
    );
    dir
}

// ---------------------------------------------------------------------------
// precheck / dedupe
// ---------------------------------------------------------------------------

#[test]
fn precheck_json_reports_blocked_project() {
    let project = duplicated_project();
    let out = run(&[
        "precheck",
        "--root",
        project.path().to_str().unwrap(),
        "--format",
        "json",
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["ready_to_execute"], false);
    assert_eq!(value["duplication_check"]["total_count"], 4);
    assert_eq!(value["issues"][0], "Duplicate locators found: 1");
    assert!(stderr(&out).contains("=== LOCATOR DEDUPLICATION SUGGESTIONS ==="));
}

#[test]
fn precheck_strict_fails_when_blocked() {
    let project = duplicated_project();
    let out = run(&[
        "precheck",
        "--root",
        project.path().to_str().unwrap(),
        "--strict",
    ]);

    assert!(!out.status.success());
    assert!(stdout(&out).starts_with("Pre-check: BLOCKED"));
    assert!(stderr(&out).contains("error: Pre-check blocked execution"));
}

#[test]
fn precheck_clean_project_is_ready_and_recorded() {
    let project = clean_project();
    let state = project.path().join("state.json");
    let out = run(&[
        "precheck",
        "--root",
        project.path().to_str().unwrap(),
        "--strict",
        "--state",
        state.to_str().unwrap(),
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).starts_with("Pre-check: READY"));
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&state).unwrap()).unwrap();
    assert_eq!(saved["last_precheck"]["ready_to_execute"], true);
}

#[test]
fn precheck_rejects_missing_root() {
    let out = run(&["precheck", "--root", "/definitely/not/a/project"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("is not a directory"));
}

#[test]
fn dedupe_limits_to_module() {
    let project = duplicated_project();
    let root = project.path().to_str().unwrap();

    let out = run(&["dedupe", "--root", root, "--module", "checkout"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("groups=1"));
    assert!(text.contains("CheckoutPage.java::SUBMIT"));

    let missing = run(&["dedupe", "--root", root, "--module", "inventory"]);
    assert!(!missing.status.success());
    assert!(stderr(&missing).contains("does not exist"));
}

// ---------------------------------------------------------------------------
// analyze / analyze-output / suggest-fix
// ---------------------------------------------------------------------------

#[test]
fn analyze_reads_stdin() {
    let mut child = bin()
        .args(["analyze"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn suite-triage");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"org.openqa.selenium.TimeoutException: Expected condition failed")
        .unwrap();
    let out = child.wait_with_output().unwrap();

    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["error_type"], "TimeoutException");
    assert_eq!(value["severity"], "HIGH");
    assert_eq!(value["recommended_actions"].as_array().unwrap().len(), 4);
}

#[test]
fn analyze_unclassified_log_succeeds() {
    let dir = TempDir::new().unwrap();
    let log = write(dir.path(), "failure.log", "Something odd happened");
    let out = run(&["analyze", "--input", log.to_str().unwrap()]);

    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert!(value["error_type"].is_null());
    assert_eq!(value["severity"], "LOW");
}

#[test]
fn analyze_uses_configured_tables() {
    let dir = TempDir::new().unwrap();
    let config = write(
        dir.path(),
        "config.yml",
        "analysis:\n  severity_rules:\n    - marker: Something odd\n      severity: CRITICAL\n",
    );
    let log = write(dir.path(), "failure.log", "Something odd happened");
    let out = run(&[
        "analyze",
        "--input",
        log.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["severity"], "CRITICAL");
}

#[test]
fn analyze_output_table_summary() {
    let dir = TempDir::new().unwrap();
    let log = write(
        dir.path(),
        "build.log",
        "[ERROR] java.lang.AssertionError: expected 1\n\
         [ERROR] Tests run: 2, Failures: 1, Errors: 0, Skipped: 0\n\
         [INFO] BUILD FAILURE\n",
    );
    let out = run(&["analyze-output", "--input", log.to_str().unwrap()]);

    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("Build: FAILURE  tests=2 failures=1"));
    assert!(text.contains("Failure lines: 2 (analyzed 2)"));
    assert!(text.contains("AssertionError"));
}

#[test]
fn suggest_fix_prints_snippet() {
    let out = run(&[
        "suggest-fix",
        "--error-type",
        "NoSuchElementException",
        "--element",
        "checkout",
    ]);
    assert!(out.status.success());
    assert!(stdout(&out).contains(r#"By.id("checkout")"#));
}

// ---------------------------------------------------------------------------
// config and state
// ---------------------------------------------------------------------------

#[test]
fn init_config_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("suite-triage.yml");
    let path_str = path.to_str().unwrap();

    assert!(run(&["init-config", "--output", path_str]).status.success());
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("high_duplication_threshold"));

    let again = run(&["init-config", "--output", path_str]);
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already exists"));

    assert!(run(&["init-config", "--output", path_str, "--force"]).status.success());
}

#[test]
fn invalid_config_is_rejected() {
    let project = clean_project();
    let config = write(
        project.path(),
        "config.yml",
        "duplication:\n  high_duplication_threshold: -5\n",
    );
    let out = run(&[
        "precheck",
        "--root",
        project.path().to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);

    assert!(!out.status.success());
    assert!(stderr(&out).contains("high_duplication_threshold"));
}

#[test]
fn requirements_changed_tracks_digest() {
    let dir = TempDir::new().unwrap();
    let requirements = write(dir.path(), "requirements.md", "# Login\n");
    let state = dir.path().join("state.json");
    let args = [
        "requirements-changed",
        "--file",
        requirements.to_str().unwrap(),
        "--state",
        state.to_str().unwrap(),
    ];

    assert_eq!(stdout(&run(&args)).trim(), "changed");
    assert_eq!(stdout(&run(&args)).trim(), "unchanged");

    fs::write(&requirements, "# Login\n# Logout\n").unwrap();
    assert_eq!(stdout(&run(&args)).trim(), "changed");
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn runner_config(dir: &Path, script: &str) -> PathBuf {
    write(
        dir,
        "runner.yml",
        &format!("runner:\n  command: [sh, -c, \"{script}\"]\n  timeout_secs: 30\n"),
    )
}

#[cfg(unix)]
#[test]
fn run_reports_passing_suite() {
    let project = clean_project();
    let config = runner_config(
        project.path(),
        "echo 'Tests run: 3, Failures: 0, Errors: 0, Skipped: 0'; echo 'BUILD SUCCESS'",
    );
    let state = project.path().join("state.json");
    let out = run(&[
        "run",
        "--root",
        project.path().to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--state",
        state.to_str().unwrap(),
        "--format",
        "json",
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["state"], "DONE");
    assert_eq!(value["build"]["tests_run"], 3);
    assert_eq!(value["tests_passed"], true);

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&state).unwrap()).unwrap();
    assert_eq!(saved["tests"]["passed"], true);
    assert_eq!(saved["tests"]["exit_code"], 0);
}

#[cfg(unix)]
#[test]
fn run_continues_when_blocked_and_fails_on_test_failure() {
    let project = duplicated_project();
    let config = runner_config(
        project.path(),
        "echo '[ERROR] org.openqa.selenium.NoSuchElementException: gone'; exit 1",
    );
    let out = run(&[
        "run",
        "--root",
        project.path().to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);

    assert!(!out.status.success());
    let text = stdout(&out);
    assert!(text.contains("INIT -> PRECHECK -> BLOCKED -> ANALYZED -> DONE"));
    assert!(text.contains("NoSuchElementException"));
    assert!(stderr(&out).contains("error: Test run failed"));
}
