//! Ordered pattern tables used by the failure analyzer.
//!
//! Both tables are plain ordered sequences. Classification is first-match,
//! so position in the table is the tie-break and is preserved through
//! serialization.

use serde::{Deserialize, Serialize};

use crate::{FailureSignature, Severity};

/// Ordered list of known error signatures.
///
/// # Examples
///
/// ```
/// use suite_triage_core::SignatureTable;
///
/// let table = SignatureTable::default();
/// assert_eq!(table.signatures[0].error_marker, "NoSuchElementException");
/// assert!(table.first_match("TimeoutException: waited 10s").is_some());
/// assert!(table.first_match("all good").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureTable {
    pub signatures: Vec<FailureSignature>,
}

impl SignatureTable {
    pub fn new(signatures: Vec<FailureSignature>) -> Self {
        Self { signatures }
    }

    /// Returns the first signature whose marker occurs anywhere in `text`.
    pub fn first_match(&self, text: &str) -> Option<&FailureSignature> {
        self.signatures
            .iter()
            .find(|sig| text.contains(sig.error_marker.as_str()))
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::new(vec![
            FailureSignature::new(
                "NoSuchElementException",
                "Locator not found on page",
                &[
                    "Verify locator selector is correct",
                    "Check if element exists in current page context",
                    "Update locator in page object",
                    "Add wait condition for element to appear",
                    "Verify page has loaded completely",
                ],
            ),
            FailureSignature::new(
                "StaleElementReferenceException",
                "Element went stale (DOM refreshed)",
                &[
                    "Add wait for element after action",
                    "Re-find element before interaction",
                    "Use explicit waits instead of implicit",
                    "Add try-catch with re-find logic",
                ],
            ),
            FailureSignature::new(
                "TimeoutException",
                "Action took too long",
                &[
                    "Increase timeout value",
                    "Wait for element visibility instead of presence",
                    "Check if element is clickable",
                    "Verify page load is complete",
                    "Check for loading spinners",
                ],
            ),
            FailureSignature::new(
                "AssertionError",
                "Expected value doesn't match actual",
                &[
                    "Update expected value in test",
                    "Check if element has correct content",
                    "Verify test data is correct",
                    "Add print statements to debug values",
                    "Check for dynamic content changes",
                ],
            ),
            FailureSignature::new(
                "ElementNotInteractableException",
                "Element exists but cannot be clicked/typed",
                &[
                    "Scroll element into view",
                    "Wait for element to be clickable",
                    "Check if element is covered by another",
                    "Add explicit wait for element readiness",
                    "Use JavaScript executor to click if needed",
                ],
            ),
            FailureSignature::new(
                "InvalidElementStateException",
                "Element is disabled or read-only",
                &[
                    "Check if element is enabled",
                    "Wait for element to be enabled",
                    "Verify element is not disabled",
                    "Check form validation state",
                ],
            ),
        ])
    }
}

/// One entry of the severity priority list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityRule {
    pub marker: String,
    pub severity: Severity,
}

impl SeverityRule {
    pub fn new(marker: &str, severity: Severity) -> Self {
        Self {
            marker: marker.to_string(),
            severity,
        }
    }
}

/// Ordered severity priority list with a LOW fallback.
///
/// Scanned independently of the [`SignatureTable`].
///
/// # Examples
///
/// ```
/// use suite_triage_core::{Severity, SeverityRules};
///
/// let rules = SeverityRules::default();
/// assert_eq!(rules.classify("TimeoutException after 30s"), Severity::High);
/// assert_eq!(rules.classify("nothing to see"), Severity::Low);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityRules {
    pub rules: Vec<SeverityRule>,
}

impl SeverityRules {
    pub fn new(rules: Vec<SeverityRule>) -> Self {
        Self { rules }
    }

    /// Severity of the first rule whose marker occurs in `text`, else LOW.
    pub fn classify(&self, text: &str) -> Severity {
        self.rules
            .iter()
            .find(|rule| text.contains(rule.marker.as_str()))
            .map_or(Severity::Low, |rule| rule.severity)
    }
}

impl Default for SeverityRules {
    fn default() -> Self {
        Self::new(vec![
            SeverityRule::new("NoSuchElementException", Severity::Critical),
            SeverityRule::new("TimeoutException", Severity::High),
            SeverityRule::new("AssertionError", Severity::Medium),
        ])
    }
}
