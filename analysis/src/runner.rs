//! Boundary to the external build tool that executes the test suite.
//!
//! The triage engine only needs "given a project root, return exit code and
//! captured output". [`CommandRunner`] provides that by spawning the build
//! tool (Maven by default) with a wall-clock limit; [`BuildSummary`] reads the
//! few facts the pipeline reports from its output.

use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Arc, LazyLock, Mutex, mpsc};
use std::time::{Duration, Instant};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Default wall-clock limit for one test-suite run (seconds).
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 1800;

/// Default build command.
pub const DEFAULT_RUN_COMMAND: &[&str] = &["mvn", "clean", "verify"];

/// How long output pipes are drained after the build tool has exited.
const PIPE_GRACE: Duration = Duration::from_secs(1);

static TESTS_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Tests run:\s*(\d+)(?:,\s*Failures:\s*(\d+))?(?:,\s*Errors:\s*(\d+))?(?:,\s*Skipped:\s*(\d+))?",
    )
    .expect("static regex must compile")
});

/// Typed error for test-runner invocation.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configured command is empty.
    #[error("runner command cannot be empty")]
    EmptyCommand,

    /// The build tool is not installed or not on `PATH`.
    #[error("build tool not found: {0}")]
    NotInstalled(String),

    /// Spawning or waiting on the build tool failed.
    #[error("IO error running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Exit status and captured output of one test-suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl RunnerOutput {
    /// Returns `true` when the run finished in time with exit code 0.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            return self.stdout.clone();
        }
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Executes the test suite of a project.
pub trait TestRunner {
    fn run(&self, root: &Path) -> Result<RunnerOutput, RunnerError>;
}

/// Runs a build command in the project root with a timeout.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self {
            program: DEFAULT_RUN_COMMAND[0].to_string(),
            args: DEFAULT_RUN_COMMAND[1..].iter().map(|a| a.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
        }
    }
}

impl CommandRunner {
    /// Creates a runner from `argv` (program first).
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::EmptyCommand`] when `argv` is empty.
    pub fn new(argv: &[String], timeout: Duration) -> Result<Self, RunnerError> {
        let (program, args) = argv.split_first().ok_or(RunnerError::EmptyCommand)?;
        if program.trim().is_empty() {
            return Err(RunnerError::EmptyCommand);
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl TestRunner for CommandRunner {
    fn run(&self, root: &Path) -> Result<RunnerOutput, RunnerError> {
        info!(program = %self.program, args = ?self.args, root = %root.display(), "Running test suite");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RunnerError::NotInstalled(self.program.clone()),
                _ => RunnerError::Io {
                    program: self.program.clone(),
                    source: e,
                },
            })?;

        // Drain both pipes concurrently so a chatty build cannot fill a pipe
        // buffer and stall before exit.
        let stdout_reader = child.stdout.take().map(PipeReader::spawn);
        let stderr_reader = child.stderr.take().map(PipeReader::spawn);

        let status = match child.wait_timeout(self.timeout) {
            Ok(status) => status,
            Err(source) => {
                warn!(program = %self.program, error = %source, "Failed to wait on test run");
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunnerError::Io {
                    program: self.program.clone(),
                    source,
                });
            }
        };

        let mut output = RunnerOutput::default();
        match status {
            Some(status) => output.exit_code = status.code(),
            None => {
                warn!(
                    program = %self.program,
                    timeout_secs = self.timeout.as_secs(),
                    "Test run timed out, killing process"
                );
                output.timed_out = true;
                let _ = child.kill();
                let _ = child.wait();
            }
        }

        // Processes forked by the build tool may keep the pipes open after it
        // exits; their readers are left behind after the grace period.
        let deadline = Instant::now() + PIPE_GRACE;
        output.stdout = stdout_reader.map(|r| r.collect(deadline)).unwrap_or_default();
        output.stderr = stderr_reader.map(|r| r.collect(deadline)).unwrap_or_default();

        debug!(
            exit_code = ?output.exit_code,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "Test run finished"
        );
        Ok(output)
    }
}

/// Background reader accumulating one child pipe.
struct PipeReader {
    buf: Arc<Mutex<Vec<u8>>>,
    done: mpsc::Receiver<()>,
}

impl PipeReader {
    fn spawn<R: Read + Send + 'static>(mut pipe: R) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let (tx, done) = mpsc::channel();
        let sink = Arc::clone(&buf);
        std::thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Ok(mut sink) = sink.lock() {
                            sink.extend_from_slice(&chunk[..n]);
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(_) => break,
                }
            }
            let _ = tx.send(());
        });
        Self { buf, done }
    }

    /// Waits for end of stream until `deadline`, then returns what was read.
    fn collect(self, deadline: Instant) -> String {
        let _ = self
            .done
            .recv_timeout(deadline.saturating_duration_since(Instant::now()));
        let bytes = self.buf.lock().map(|buf| buf.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Facts read from build-tool output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// `BUILD SUCCESS` was printed.
    pub build_success: bool,
    pub tests_run: Option<u32>,
    pub failures: Option<u32>,
    pub errors: Option<u32>,
    pub skipped: Option<u32>,
}

impl BuildSummary {
    /// Parses Maven/Surefire output.
    ///
    /// Counts come from the last `Tests run:` line, which is the aggregate
    /// printed under `Results:`.
    ///
    /// # Examples
    ///
    /// ```
    /// use suite_triage_analysis::runner::BuildSummary;
    ///
    /// let out = "\
    /// [INFO] Tests run: 2, Failures: 0, Errors: 0, Skipped: 0, Time elapsed: 1.2 s
    /// [INFO] Results:
    /// [INFO] Tests run: 5, Failures: 1, Errors: 0, Skipped: 1
    /// [INFO] BUILD SUCCESS
    /// ";
    /// let summary = BuildSummary::parse(out);
    /// assert!(summary.build_success);
    /// assert_eq!(summary.tests_run, Some(5));
    /// assert_eq!(summary.failures, Some(1));
    /// ```
    pub fn parse(output: &str) -> Self {
        let mut summary = Self {
            build_success: output.contains("BUILD SUCCESS"),
            ..Self::default()
        };

        if let Some(caps) = TESTS_RUN.captures_iter(output).last() {
            let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
            summary.tests_run = num(1);
            summary.failures = num(2);
            summary.errors = num(3);
            summary.skipped = num(4);
        }

        summary
    }
}
