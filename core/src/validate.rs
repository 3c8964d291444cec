//! Pattern table and layout validation.
//!
//! Custom tables loaded from configuration are checked before they reach the
//! analyzer: an empty marker would match every log, and a repeated marker can
//! never win under first-match classification.
//!
//! # Examples
//!
//! ```
//! use suite_triage_core::*;
//!
//! assert!(validate_signature_table(&SignatureTable::default()).is_empty());
//!
//! let bad = SignatureTable::new(vec![FailureSignature::new("", "cause", &[])]);
//! assert!(!validate_signature_table(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{ArtifactLayout, SeverityRules, SignatureTable};

/// Table and layout validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A signature or severity marker is empty or whitespace-only.
    #[error("marker cannot be empty (entry {0})")]
    EmptyMarker(usize),
    /// Two entries in the same table share a marker; the later one is dead.
    #[error("duplicate marker in table: {0}")]
    DuplicateMarker(String),
    /// A signature has no cause text.
    #[error("signature has empty cause: {0}")]
    EmptyCause(String),
    /// A layout directory is empty.
    #[error("layout directory cannot be empty: {0}")]
    EmptyLayoutDir(&'static str),
    /// A layout file-name filter is empty.
    #[error("layout file filter cannot be empty: {0}")]
    EmptyLayoutFilter(&'static str),
}

/// Validates a signature table.
///
/// Returns every problem found, in table order.
pub fn validate_signature_table(table: &SignatureTable) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (index, sig) in table.signatures.iter().enumerate() {
        let marker = sig.error_marker.as_str();
        if marker.trim().is_empty() {
            errors.push(ValidationError::EmptyMarker(index));
            continue;
        }
        if !seen.insert(marker) {
            errors.push(ValidationError::DuplicateMarker(marker.to_string()));
        }
        if sig.cause.trim().is_empty() {
            errors.push(ValidationError::EmptyCause(marker.to_string()));
        }
    }

    errors
}

/// Validates a severity priority list.
pub fn validate_severity_rules(rules: &SeverityRules) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (index, rule) in rules.rules.iter().enumerate() {
        let marker = rule.marker.as_str();
        if marker.trim().is_empty() {
            errors.push(ValidationError::EmptyMarker(index));
            continue;
        }
        if !seen.insert(marker) {
            errors.push(ValidationError::DuplicateMarker(marker.to_string()));
        }
    }

    errors
}

/// Validates an artifact layout.
pub fn validate_layout(layout: &ArtifactLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if layout.pages_dir.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyLayoutDir("pages_dir"));
    }
    if layout.steps_dir.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyLayoutDir("steps_dir"));
    }
    if layout.page_file_marker.is_empty() {
        errors.push(ValidationError::EmptyLayoutFilter("page_file_marker"));
    }
    if layout.step_file_suffix.is_empty() {
        errors.push(ValidationError::EmptyLayoutFilter("step_file_suffix"));
    }

    errors
}
