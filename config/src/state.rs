//! Persistent run state.
//!
//! Tracks the SHA-256 digest of the requirements document so callers can skip
//! regeneration when it has not changed, plus the outcome of the most recent
//! pre-check and test run.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use suite_triage_core::PreCheckReport;
use tracing::{info, warn};

use crate::error::Result;

/// Condensed outcome of a pre-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecheckSummary {
    pub timestamp: String,
    pub ready_to_execute: bool,
    pub issues: Vec<String>,
}

/// Outcome of an external test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub passed: bool,
    pub exit_code: Option<i32>,
    pub timestamp: String,
}

/// Run state stored as JSON between invocations.
///
/// # Examples
///
/// ```
/// use suite_triage_config::RunState;
///
/// let dir = tempfile::tempdir().unwrap();
/// let requirements = dir.path().join("requirements.md");
/// std::fs::write(&requirements, "# Login\n").unwrap();
///
/// let mut state = RunState::default();
/// assert!(state.check_requirements(&requirements).unwrap());
/// assert!(!state.check_requirements(&requirements).unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunState {
    /// SHA-256 hex digest of the requirements document when last seen.
    pub last_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_precheck: Option<PrecheckSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<TestOutcome>,
    /// RFC 3339 time of the last update.
    pub timestamp: Option<String>,
}

impl RunState {
    /// Loads state from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let state = serde_json::from_reader(reader)?;
        Ok(state)
    }

    /// Loads state, or starts fresh when the file does not exist yet.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Saves state as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Computes the SHA-256 hex digest of a file.
    pub fn digest_file(path: impl AsRef<Path>) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let hash = Sha256::digest(&bytes);
        Ok(format!("{:x}", hash))
    }

    /// Returns `true` if the requirements document changed since the last
    /// recorded digest, and records the new digest when it did.
    ///
    /// A missing document counts as unchanged.
    pub fn check_requirements(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Requirements file missing");
            return Ok(false);
        }

        let current = Self::digest_file(path)?;
        let changed = self.last_hash.as_deref() != Some(current.as_str());
        info!(path = %path.display(), changed, "Checked requirements");

        if changed {
            self.last_hash = Some(current);
            self.touch();
        }
        Ok(changed)
    }

    pub fn record_precheck(&mut self, report: &PreCheckReport) {
        self.last_precheck = Some(PrecheckSummary {
            timestamp: report.timestamp.clone(),
            ready_to_execute: report.ready_to_execute,
            issues: report.issues.clone(),
        });
        self.touch();
    }

    pub fn record_tests(&mut self, passed: bool, exit_code: Option<i32>) {
        self.tests = Some(TestOutcome {
            passed,
            exit_code,
            timestamp: Utc::now().to_rfc3339(),
        });
        self.touch();
    }

    fn touch(&mut self) {
        self.timestamp = Some(Utc::now().to_rfc3339());
    }
}
