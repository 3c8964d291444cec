//! Configuration and run-state files for suite-triage.
//!
//! - [`TriageConfig`]: YAML configuration (artifact layout, duplication
//!   threshold, failure tables, test-runner command).
//! - [`RunState`]: JSON state remembering the requirements digest and the
//!   last pre-check and test outcome.
//!
//! # Quick start
//!
//! ```no_run
//! use suite_triage_config::{RunState, TriageConfig};
//!
//! let config = TriageConfig::load(".suite-triage.yml").unwrap();
//! config.validate().unwrap();
//!
//! let mut state = RunState::load_or_default(".suite-triage-state.json").unwrap();
//! if state.check_requirements("requirements.md").unwrap() {
//!     println!("requirements changed, regenerate");
//! }
//! state.save(".suite-triage-state.json").unwrap();
//! ```

mod config;
mod error;
mod state;

pub use config::{AnalysisConfig, CONFIG_VERSION, DuplicationConfig, RunnerConfig, TriageConfig};
pub use error::{ConfigError, Result};
pub use state::{PrecheckSummary, RunState, TestOutcome};
