//! Line-oriented declaration extraction.
//!
//! A best-effort heuristic over generated Java source, not a grammar. Each
//! line is tried against one narrow pattern; a line that looks like a
//! declaration but does not parse is counted in
//! [`Extraction::skipped_lines`] and the scan moves on.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use suite_triage_core::{LocatorEntry, StepEntry, StepKeyword};
use tracing::debug;

/// `public static final By NAME = By.call(...);` with an optional trailing
/// comment. Arguments are string literals, plain tokens, or one level of
/// nested calls.
static LOCATOR_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*public\s+static\s+final\s+By\s+([A-Za-z_$][\w$]*)\s*=\s*",
        r#"((?i:by)\s*\.\s*\w+\s*\((?:[^"()]|"(?:[^"\\]|\\.)*"|\((?:[^"()]|"(?:[^"\\]|\\.)*")*\))*\))"#,
        r"\s*;\s*(?://.*|/\*.*)?$",
    ))
    .expect("static regex must compile")
});

/// Anything that starts like a locator field.
static LOCATOR_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*public\s+static\s+final\s+By\b").expect("static regex must compile")
});

/// `@Given("...")`, `@When("...")`, `@Then("...")` with escaped quotes allowed.
static STEP_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(Given|When|Then)\s*\(\s*"((?:[^"\\]|\\.)*)"\s*\)"#)
        .expect("static regex must compile")
});

static STEP_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(Given|When|Then)\b").expect("static regex must compile"));

/// Entries extracted from one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<T> {
    pub entries: Vec<T>,
    pub skipped_lines: usize,
}

impl<T> Default for Extraction<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            skipped_lines: 0,
        }
    }
}

/// Extracts locator fields from a page-object source.
///
/// # Examples
///
/// ```
/// use suite_triage_analysis::extract::extract_locators;
///
/// let src = r#"
///     public static final By USERNAME = By.id("user-name");
///     private static final String URL = "https://example.com";
/// "#;
/// let found = extract_locators("LoginPage.java".as_ref(), src);
/// assert_eq!(found.entries.len(), 1);
/// assert_eq!(found.entries[0].name, "USERNAME");
/// assert_eq!(found.entries[0].raw_value, r#"By.id("user-name")"#);
/// ```
pub fn extract_locators(path: &Path, text: &str) -> Extraction<LocatorEntry> {
    let mut out = Extraction::default();

    for (index, line) in text.lines().enumerate() {
        if let Some(caps) = LOCATOR_DECL.captures(line) {
            out.entries.push(LocatorEntry {
                file: path.to_path_buf(),
                name: caps[1].to_string(),
                raw_value: caps[2].trim().to_string(),
            });
        } else if LOCATOR_HINT.is_match(line) {
            debug!(file = %path.display(), line = index + 1, "Skipping malformed locator line");
            out.skipped_lines += 1;
        }
    }

    out
}

/// Extracts Cucumber step annotations from a step-definition source.
///
/// # Examples
///
/// ```
/// use suite_triage_analysis::extract::extract_steps;
/// use suite_triage_core::StepKeyword;
///
/// let src = r#"@When("I click {string} on {string}")"#;
/// let found = extract_steps("GenericSteps.java".as_ref(), src);
/// assert_eq!(found.entries[0].pattern_type, StepKeyword::When);
/// assert_eq!(found.entries[0].pattern_text, "I click {string} on {string}");
/// ```
pub fn extract_steps(path: &Path, text: &str) -> Extraction<StepEntry> {
    let mut out = Extraction::default();

    for (index, line) in text.lines().enumerate() {
        let before = out.entries.len();
        for caps in STEP_DECL.captures_iter(line) {
            let Some(keyword) = StepKeyword::from_annotation(&caps[1]) else {
                continue;
            };
            out.entries.push(StepEntry {
                file: path.to_path_buf(),
                pattern_type: keyword,
                pattern_text: caps[2].to_string(),
            });
        }
        if out.entries.len() == before && STEP_HINT.is_match(line) {
            debug!(file = %path.display(), line = index + 1, "Skipping malformed step annotation");
            out.skipped_lines += 1;
        }
    }

    out
}
