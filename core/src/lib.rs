//! Core types and pattern tables for UI test artifact triage.
//!
//! This crate defines the data model shared by the analysis engine:
//!
//! - [`SourceArtifact`]: a generated source file handed to the checker,
//!   including read failures.
//! - [`LocatorEntry`] / [`StepEntry`]: declarations extracted from page
//!   objects and step definitions.
//! - [`DuplicationReport`]: duplicate groups plus the group-based
//!   duplication percentage.
//! - [`SignatureTable`] / [`SeverityRules`]: ordered, first-match tables
//!   driving failure classification.
//! - [`FailureAnalysis`] / [`PreCheckReport`]: per-call results.
//!
//! Validation ([`validate_signature_table`], [`validate_severity_rules`],
//! [`validate_layout`]) catches tables that could never classify correctly.
//!
//! # Example
//!
//! ```
//! use suite_triage_core::*;
//!
//! let table = SignatureTable::default();
//! let rules = SeverityRules::default();
//! let log = "org.openqa.selenium.NoSuchElementException: no such element";
//!
//! assert_eq!(
//!     table.first_match(log).map(|s| s.error_marker.as_str()),
//!     Some("NoSuchElementException")
//! );
//! assert_eq!(rules.classify(log), Severity::Critical);
//! assert!(validate_signature_table(&table).is_empty());
//! ```

mod layout;
mod tables;
mod types;
mod validate;

pub use layout::{ArtifactKind, ArtifactLayout};
pub use tables::{SeverityRule, SeverityRules, SignatureTable};
pub use types::*;
pub use validate::{
    ValidationError, validate_layout, validate_severity_rules, validate_signature_table,
};
