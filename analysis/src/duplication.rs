//! Duplicate locator and step detection across generated artifacts.
//!
//! Declarations are grouped by a normalized value: the lowercased, trimmed
//! selector expression for locators and the lowercased pattern text for
//! steps. Groups keep first-seen order so identical input always yields an
//! identical report.
//!
//! # Example
//!
//! ```
//! use suite_triage_analysis::duplication::DuplicationChecker;
//! use suite_triage_core::SourceArtifact;
//!
//! let files = vec![
//!     SourceArtifact::loaded(
//!         "LoginPage.java",
//!         r#"public static final By LOGIN_BUTTON = By.id("login-button");"#,
//!     ),
//!     SourceArtifact::loaded(
//!         "CheckoutPage.java",
//!         r#"public static final By SUBMIT_BTN = By.id("login-button");"#,
//!     ),
//! ];
//!
//! let report = DuplicationChecker::default().check_locator_duplication(&files);
//! assert_eq!(report.total_count, 2);
//! assert_eq!(report.duplicate_groups.len(), 1);
//! assert_eq!(report.duplication_percentage, 50.0);
//! ```

use std::collections::HashMap;
use std::path::Path;

use suite_triage_core::{
    ArtifactContent, DeclarationKind, DuplicateGroup, DuplicationReport, Occurrence,
    SourceArtifact,
};
use tracing::{debug, info, warn};

use crate::extract::{Extraction, extract_locators, extract_steps};

/// Duplication percentage above which suggestions escalate.
pub const DEFAULT_HIGH_DUPLICATION_THRESHOLD: f64 = 20.0;

/// Scans artifact collections for repeated declarations.
#[derive(Debug, Clone)]
pub struct DuplicationChecker {
    high_duplication_threshold: f64,
}

impl Default for DuplicationChecker {
    fn default() -> Self {
        Self {
            high_duplication_threshold: DEFAULT_HIGH_DUPLICATION_THRESHOLD,
        }
    }
}

impl DuplicationChecker {
    /// Creates a checker with a custom high-duplication threshold (percent).
    pub fn with_threshold(high_duplication_threshold: f64) -> Self {
        Self {
            high_duplication_threshold,
        }
    }

    pub fn high_duplication_threshold(&self) -> f64 {
        self.high_duplication_threshold
    }

    /// Groups locator fields by normalized selector expression.
    ///
    /// Missing artifacts are skipped silently; unreadable ones are skipped and
    /// noted in [`DuplicationReport::read_errors`].
    pub fn check_locator_duplication(&self, files: &[SourceArtifact]) -> DuplicationReport {
        scan(DeclarationKind::Locator, files, |path, text| {
            let Extraction {
                entries,
                skipped_lines,
            } = extract_locators(path, text);
            let keyed = entries
                .into_iter()
                .map(|entry| {
                    (
                        normalize_selector(&entry.raw_value),
                        Occurrence {
                            file: entry.file,
                            name: entry.name,
                        },
                    )
                })
                .collect();
            (keyed, skipped_lines)
        })
    }

    /// Groups step annotations by lowercased pattern text.
    ///
    /// Occurrence names carry the step keyword (`Given`, `When`, `Then`).
    pub fn check_step_duplication(&self, files: &[SourceArtifact]) -> DuplicationReport {
        scan(DeclarationKind::Step, files, |path, text| {
            let Extraction {
                entries,
                skipped_lines,
            } = extract_steps(path, text);
            let keyed = entries
                .into_iter()
                .map(|entry| {
                    (
                        normalize_step(&entry.pattern_text),
                        Occurrence {
                            file: entry.file,
                            name: entry.pattern_type.to_string(),
                        },
                    )
                })
                .collect();
            (keyed, skipped_lines)
        })
    }

    /// Human-readable remediation guidance for a report.
    ///
    /// Empty when the report has no duplicates and stays under the
    /// high-duplication threshold.
    ///
    /// # Examples
    ///
    /// ```
    /// use suite_triage_analysis::duplication::DuplicationChecker;
    /// use suite_triage_core::{DeclarationKind, DuplicationReport};
    ///
    /// let checker = DuplicationChecker::default();
    /// let clean = DuplicationReport::empty(DeclarationKind::Step);
    /// assert!(checker.suggest_deduplication(&clean).is_empty());
    /// ```
    pub fn suggest_deduplication(&self, report: &DuplicationReport) -> Vec<String> {
        let mut suggestions = Vec::new();

        if report.has_duplicates() {
            let count = report.duplicate_groups.len();
            let (title, noun, options) = match report.kind {
                DeclarationKind::Step => (
                    "STEP DEDUPLICATION SUGGESTIONS",
                    "duplicate step definitions",
                    [
                        "1. Create shared step definition file",
                        "2. Use inheritance for similar steps",
                        "3. Create parameterized generic steps",
                        "4. Remove redundant step files",
                    ],
                ),
                DeclarationKind::Locator => (
                    "LOCATOR DEDUPLICATION SUGGESTIONS",
                    "duplicate locators",
                    [
                        "1. Create shared locator constants file",
                        "2. Use inheritance in page objects",
                        "3. Create base page with common locators",
                        "4. Use composition for shared elements",
                    ],
                ),
            };
            suggestions.push(format!("=== {title} ==="));
            suggestions.push(format!("Found {count} {noun}"));
            suggestions.push("Options:".to_string());
            suggestions.extend(options.iter().map(|o| o.to_string()));
        }

        if report.duplication_percentage > self.high_duplication_threshold {
            suggestions.push(format!(
                "HIGH DUPLICATION: {:.1}% > {}%",
                report.duplication_percentage, self.high_duplication_threshold
            ));
            suggestions.push("Recommend refactoring to reduce maintenance burden".to_string());
        }

        suggestions
    }
}

/// Keeps only the groups that involve at least one declaration under
/// `module_dir`.
///
/// Used after generating a new page-object module to see which of its
/// locators collide with existing ones. `total_count` is unchanged and the
/// percentage is recomputed over the retained groups.
pub fn restrict_to_module(report: &DuplicationReport, module_dir: &Path) -> DuplicationReport {
    let mut restricted = report.clone();
    restricted
        .duplicate_groups
        .retain(|group| group.touches(module_dir));
    restricted.refresh_percentage();
    restricted
}

/// Lowercased, trimmed selector expression.
pub fn normalize_selector(raw_value: &str) -> String {
    raw_value.trim().to_lowercase()
}

/// Lowercased pattern text.
pub fn normalize_step(pattern_text: &str) -> String {
    pattern_text.to_lowercase()
}

fn scan<F>(kind: DeclarationKind, files: &[SourceArtifact], mut extract: F) -> DuplicationReport
where
    F: FnMut(&Path, &str) -> (Vec<(String, Occurrence)>, usize),
{
    let mut report = DuplicationReport::empty(kind);
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for artifact in files {
        let text = match &artifact.content {
            ArtifactContent::Loaded(text) => text,
            ArtifactContent::Missing => {
                debug!(file = %artifact.path.display(), "Skipping missing artifact");
                continue;
            }
            ArtifactContent::Unreadable(reason) => {
                warn!(file = %artifact.path.display(), error = %reason, "Skipping unreadable artifact");
                report
                    .read_errors
                    .push(format!("Error reading {}: {reason}", artifact.path.display()));
                continue;
            }
        };

        let (keyed, skipped) = extract(&artifact.path, text);
        report.skipped_lines += skipped;
        if keyed.is_empty() {
            continue;
        }

        report.total_count += keyed.len();
        report.affected_files.insert(artifact.path.clone());
        for (key, occurrence) in keyed {
            match index.get(&key) {
                Some(&slot) => groups[slot].occurrences.push(occurrence),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(DuplicateGroup {
                        normalized_key: key,
                        occurrences: vec![occurrence],
                    });
                }
            }
        }
    }

    report.duplicate_groups = groups.into_iter().filter(|g| g.count() > 1).collect();
    report.refresh_percentage();

    info!(
        kind = %kind,
        total = report.total_count,
        duplicates = report.duplicate_groups.len(),
        percentage = report.duplication_percentage,
        "Duplication scan finished"
    );

    report
}
