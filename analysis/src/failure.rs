//! Failure log classification.
//!
//! Two independent passes run over the raw log:
//!
//! 1. the [`SignatureTable`] is scanned in order and the first signature whose
//!    marker occurs anywhere in the text supplies `error_type`, `cause` and
//!    `fixes`;
//! 2. the [`SeverityRules`] are scanned in their own order to pick the
//!    severity bucket.
//!
//! The passes never consult each other, so a log carrying several markers can
//! produce an `error_type` and a `severity` that point at different
//! exceptions.

use serde::{Deserialize, Serialize};
use suite_triage_core::{FailureAnalysis, SeverityRules, SignatureTable};
use tracing::{debug, info};

/// Number of failure lines analyzed per test run by default.
pub const DEFAULT_MAX_FAILURE_LINES: usize = 3;

/// Substrings that flag a line of build output as a failure indicator.
const FAILURE_LINE_MARKERS: &[&str] = &["FAILED", "ERROR", "Exception"];

/// Classifies failure logs against injected pattern tables.
///
/// # Examples
///
/// ```
/// use suite_triage_analysis::failure::FailureAnalyzer;
/// use suite_triage_core::Severity;
///
/// let analyzer = FailureAnalyzer::default();
/// let analysis = analyzer
///     .analyze_failure("org.openqa.selenium.NoSuchElementException: no such element");
/// assert_eq!(analysis.error_type.as_deref(), Some("NoSuchElementException"));
/// assert_eq!(analysis.severity, Severity::Critical);
/// assert!(!analysis.fixes.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct FailureAnalyzer {
    signatures: SignatureTable,
    severity_rules: SeverityRules,
    max_failure_lines: usize,
}

impl Default for FailureAnalyzer {
    fn default() -> Self {
        Self::new(SignatureTable::default(), SeverityRules::default())
    }
}

/// One failure line from build output and its analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAnalysis {
    pub line: String,
    pub analysis: FailureAnalysis,
}

/// Analysis of a whole test-run output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputAnalysis {
    /// Number of failure indicator lines found in the output.
    pub failure_line_count: usize,
    /// Analyses of the first few failure lines, in output order.
    pub analyzed: Vec<LineAnalysis>,
}

impl OutputAnalysis {
    /// Returns `true` when no failure indicators were found.
    pub fn all_passed(&self) -> bool {
        self.failure_line_count == 0
    }
}

impl FailureAnalyzer {
    pub fn new(signatures: SignatureTable, severity_rules: SeverityRules) -> Self {
        Self {
            signatures,
            severity_rules,
            max_failure_lines: DEFAULT_MAX_FAILURE_LINES,
        }
    }

    /// Sets how many failure lines [`analyze_test_output`](Self::analyze_test_output)
    /// inspects.
    pub fn with_max_failure_lines(mut self, max_failure_lines: usize) -> Self {
        self.max_failure_lines = max_failure_lines;
        self
    }

    pub fn signatures(&self) -> &SignatureTable {
        &self.signatures
    }

    pub fn severity_rules(&self) -> &SeverityRules {
        &self.severity_rules
    }

    /// Classifies one failure log.
    ///
    /// Never fails: an unmatched log yields an analysis with no `error_type`,
    /// no `cause`, empty `fixes` and whatever severity the second pass picks.
    pub fn analyze_failure(&self, log_text: &str) -> FailureAnalysis {
        let matched = self.signatures.first_match(log_text);
        let severity = self.severity_rules.classify(log_text);

        debug!(
            error_type = ?matched.map(|s| s.error_marker.as_str()),
            severity = %severity,
            "Classified failure log"
        );

        FailureAnalysis {
            error_type: matched.map(|s| s.error_marker.clone()),
            cause: matched.map(|s| s.cause.clone()),
            fixes: matched.map(|s| s.fixes.clone()).unwrap_or_default(),
            severity,
            recommended_actions: severity
                .recommended_actions()
                .iter()
                .map(|a| a.to_string())
                .collect(),
        }
    }

    /// Finds failure indicator lines in test-run output and analyzes the first
    /// few of them.
    pub fn analyze_test_output(&self, output: &str) -> OutputAnalysis {
        let lines = failure_lines(output);
        let failure_line_count = lines.len();
        let analyzed: Vec<LineAnalysis> = lines
            .into_iter()
            .take(self.max_failure_lines)
            .map(|line| LineAnalysis {
                analysis: self.analyze_failure(line),
                line: line.to_string(),
            })
            .collect();

        info!(
            failure_lines = failure_line_count,
            analyzed = analyzed.len(),
            "Analyzed test output"
        );

        OutputAnalysis {
            failure_line_count,
            analyzed,
        }
    }
}

/// Returns up to `limit` failure indicator lines from `output`, trimmed.
///
/// A line is a failure indicator when it contains `FAILED`, `ERROR` or
/// `Exception`.
///
/// # Examples
///
/// ```
/// use suite_triage_analysis::failure::extract_failure_lines;
///
/// let output = "[INFO] Running LoginTest\n[ERROR] login FAILED\n[INFO] done\n";
/// assert_eq!(extract_failure_lines(output, 3), vec!["[ERROR] login FAILED"]);
/// ```
pub fn extract_failure_lines(output: &str, limit: usize) -> Vec<&str> {
    failure_lines(output).into_iter().take(limit).collect()
}

fn failure_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| FAILURE_LINE_MARKERS.iter().any(|m| line.contains(m)))
        .collect()
}

/// Returns a canned Java/Selenium remediation snippet for `error_type`.
///
/// Covers `NoSuchElementException`, `StaleElementReferenceException`,
/// `TimeoutException` and `ElementNotInteractableException`; any other type
/// gets a generic pointer back to the analyzer output.
///
/// # Examples
///
/// ```
/// use suite_triage_analysis::failure::suggest_fix_snippet;
///
/// let snippet = suggest_fix_snippet("TimeoutException", "login-button");
/// assert!(snippet.contains("\"login-button\""));
///
/// let fallback = suggest_fix_snippet("SomethingElse", "x");
/// assert!(fallback.contains("Unable to suggest specific fix"));
/// ```
pub fn suggest_fix_snippet(error_type: &str, element_name: &str) -> String {
    match error_type {
        "NoSuchElementException" => format!(
            r#"// Fix: add an explicit wait for the element
new WebDriverWait(driver, Duration.ofSeconds(10))
    .until(ExpectedConditions.presenceOfElementLocated(By.id("{element_name}")));
WebElement element = driver.findElement(By.id("{element_name}"));
"#
        ),
        "StaleElementReferenceException" => format!(
            r#"// Fix: re-find the element before use
try {{
    driver.findElement(By.id("{element_name}")).click();
}} catch (StaleElementReferenceException e) {{
    // Re-find and retry
    new WebDriverWait(driver, Duration.ofSeconds(10))
        .until(ExpectedConditions.presenceOfElementLocated(By.id("{element_name}")));
    driver.findElement(By.id("{element_name}")).click();
}}
"#
        ),
        "TimeoutException" => format!(
            r#"// Fix: increase the timeout and wait for clickability
WebElement element = new WebDriverWait(driver, Duration.ofSeconds(20))
    .until(ExpectedConditions.elementToBeClickable(By.id("{element_name}")));
element.click();
"#
        ),
        "ElementNotInteractableException" => format!(
            r#"// Fix: scroll into view and wait for clickability
WebElement element = driver.findElement(By.id("{element_name}"));
((JavascriptExecutor) driver).executeScript("arguments[0].scrollIntoView(true);", element);
new WebDriverWait(driver, Duration.ofSeconds(10))
    .until(ExpectedConditions.elementToBeClickable(By.id("{element_name}")));
element.click();
"#
        ),
        _ => "// Unable to suggest specific fix. See analyzer output.".to_string(),
    }
}
