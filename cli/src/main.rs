use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use suite_triage_analysis::discover::{ArtifactSource, FsArtifactSource};
use suite_triage_analysis::duplication::{DuplicationChecker, restrict_to_module};
use suite_triage_analysis::failure::{FailureAnalyzer, suggest_fix_snippet};
use suite_triage_analysis::flow::FlowOrchestrator;
use suite_triage_analysis::output::{
    OutputFormat, format_analysis, format_duplication, format_output_analysis, format_precheck,
    format_run,
};
use suite_triage_analysis::runner::{BuildSummary, CommandRunner};
use suite_triage_config::{RunState, TriageConfig};
use suite_triage_core::ArtifactKind;
use tracing::debug;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(fmt: CliOutputFormat) -> Self {
        match fmt {
            CliOutputFormat::Json => Self::Json,
            CliOutputFormat::Yaml => Self::Yaml,
            CliOutputFormat::Markdown => Self::Markdown,
            CliOutputFormat::Table => Self::Table,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "suite-triage")]
#[command(about = "Duplication checks and failure triage for generated UI test suites")]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check generated page objects and step definitions for duplicates.
    Precheck(PrecheckArgs),
    /// Show locator duplicates involving one page-object module.
    Dedupe(DedupeArgs),
    /// Classify a single failure log (from a file or stdin).
    Analyze(AnalyzeArgs),
    /// Analyze the failure lines of a captured test-run output.
    AnalyzeOutput(AnalyzeOutputArgs),
    /// Print a remediation snippet for an error type.
    SuggestFix(SuggestFixArgs),
    /// Pre-check, run the test suite, and analyze its output.
    Run(RunArgs),
    /// Report whether the requirements document changed since the last check.
    RequirementsChanged(RequirementsChangedArgs),
    /// Write the default configuration file.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
struct PrecheckArgs {
    /// Project root containing the generated sources.
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
    /// Exit non-zero when the pre-check blocks execution.
    #[arg(long)]
    strict: bool,
    /// Record the outcome in this run-state file.
    #[arg(long)]
    state: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DedupeArgs {
    /// Project root containing the generated sources.
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Module directory under the pages directory (e.g. `checkout`).
    #[arg(long)]
    module: PathBuf,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Failure log file (stdin when omitted).
    #[arg(long)]
    input: Option<PathBuf>,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct AnalyzeOutputArgs {
    /// Captured build-tool output.
    #[arg(long)]
    input: PathBuf,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct SuggestFixArgs {
    /// Exception simple name (e.g. `TimeoutException`).
    #[arg(long)]
    error_type: String,
    /// Element id used in the snippet.
    #[arg(long)]
    element: String,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Project root containing the generated sources.
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
    /// Record the outcome in this run-state file.
    #[arg(long)]
    state: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RequirementsChangedArgs {
    /// Requirements document.
    #[arg(long)]
    file: PathBuf,
    /// Run-state file (created when missing).
    #[arg(long)]
    state: PathBuf,
}

#[derive(Debug, Args)]
struct InitConfigArgs {
    /// Destination path.
    #[arg(long, default_value = "suite-triage.yml")]
    output: PathBuf,
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Precheck(args) => run_precheck(args),
        Command::Dedupe(args) => run_dedupe(args),
        Command::Analyze(args) => run_analyze(args),
        Command::AnalyzeOutput(args) => run_analyze_output(args),
        Command::SuggestFix(args) => run_suggest_fix(args),
        Command::Run(args) => run_pipeline(args),
        Command::RequirementsChanged(args) => run_requirements_changed(args),
        Command::InitConfig(args) => run_init_config(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_precheck(args: PrecheckArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let orchestrator = orchestrator(&args.root, &config)?;
    let format: OutputFormat = args.format.into();

    let report = orchestrator
        .check_before_execution()
        .map_err(|err| format!("Pre-check failed: {err}"))?;

    println!("{}", format_precheck(&report, format)?);
    print_suggestions(&orchestrator.suggestions(&report), format);

    if let Some(ref state_path) = args.state {
        let mut state = load_state(state_path)?;
        state.record_precheck(&report);
        save_state(&state, state_path)?;
    }

    if args.strict && !report.ready_to_execute {
        return Err(format!(
            "Pre-check blocked execution: {}",
            report.issues.join(", ")
        ));
    }
    Ok(())
}

fn run_dedupe(args: DedupeArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let source = artifact_source(&args.root, &config)?;
    let module_dir = source.dir_for(ArtifactKind::Pages).join(&args.module);
    if !module_dir.is_dir() {
        return Err(format!(
            "Module directory '{}' does not exist",
            module_dir.display()
        ));
    }

    let pages = source
        .discover(ArtifactKind::Pages)
        .map_err(|err| format!("Discovery failed: {err}"))?;
    let checker = checker(&config);
    let report = restrict_to_module(&checker.check_locator_duplication(&pages), &module_dir);
    let format: OutputFormat = args.format.into();

    println!("{}", format_duplication(&report, format)?);
    print_suggestions(&checker.suggest_deduplication(&report), format);
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let log_text = match args.input {
        Some(ref path) => read_text(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            text
        }
    };

    let analysis = analyzer(&config).analyze_failure(&log_text);
    println!("{}", format_analysis(&analysis, args.format.into())?);
    Ok(())
}

fn run_analyze_output(args: AnalyzeOutputArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let output = read_text(&args.input)?;

    let build = BuildSummary::parse(&output);
    let analysis = analyzer(&config).analyze_test_output(&output);
    println!(
        "{}",
        format_output_analysis(&build, &analysis, args.format.into())?
    );
    Ok(())
}

fn run_suggest_fix(args: SuggestFixArgs) -> Result<(), String> {
    println!("{}", suggest_fix_snippet(&args.error_type, &args.element));
    Ok(())
}

fn run_pipeline(args: RunArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let orchestrator = orchestrator(&args.root, &config)?;
    let runner = CommandRunner::new(
        &config.runner.command,
        Duration::from_secs(config.runner.timeout_secs),
    )
    .map_err(|err| err.to_string())?;

    let run = orchestrator
        .execute(&runner, &args.root)
        .map_err(|err| format!("Pipeline failed: {err}"))?;

    println!("{}", format_run(&run, args.format.into())?);

    if let Some(ref state_path) = args.state {
        let mut state = load_state(state_path)?;
        if let Some(ref precheck) = run.precheck {
            state.record_precheck(precheck);
        }
        state.record_tests(run.tests_passed.unwrap_or(false), run.exit_code);
        save_state(&state, state_path)?;
    }

    if run.tests_passed != Some(true) {
        return Err("Test run failed".to_string());
    }
    Ok(())
}

fn run_requirements_changed(args: RequirementsChangedArgs) -> Result<(), String> {
    let mut state = load_state(&args.state)?;
    let changed = state
        .check_requirements(&args.file)
        .map_err(|err| format!("Failed to check '{}': {err}", args.file.display()))?;
    save_state(&state, &args.state)?;

    println!("{}", if changed { "changed" } else { "unchanged" });
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "'{}' already exists (use --force to overwrite)",
            args.output.display()
        ));
    }
    TriageConfig::default()
        .save(&args.output)
        .map_err(|err| format!("Failed to write '{}': {err}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<TriageConfig, String> {
    let Some(path) = path else {
        return Ok(TriageConfig::default());
    };
    let config = TriageConfig::load(path)
        .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?;
    config
        .validate()
        .map_err(|err| format!("Config '{}': {err}", path.display()))?;
    debug!(path = %path.display(), "Using configuration");
    Ok(config)
}

fn load_state(path: &Path) -> Result<RunState, String> {
    RunState::load_or_default(path)
        .map_err(|err| format!("Failed to load state '{}': {err}", path.display()))
}

fn save_state(state: &RunState, path: &Path) -> Result<(), String> {
    state
        .save(path)
        .map_err(|err| format!("Failed to save state '{}': {err}", path.display()))
}

fn read_text(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("Failed to read '{}': {err}", path.display()))
}

fn artifact_source(root: &Path, config: &TriageConfig) -> Result<FsArtifactSource, String> {
    FsArtifactSource::new(root, config.layout.clone()).map_err(|err| err.to_string())
}

fn checker(config: &TriageConfig) -> DuplicationChecker {
    DuplicationChecker::with_threshold(config.duplication.high_duplication_threshold)
}

fn analyzer(config: &TriageConfig) -> FailureAnalyzer {
    FailureAnalyzer::new(
        config.analysis.signature_table(),
        config.analysis.severity_rules(),
    )
    .with_max_failure_lines(config.analysis.max_failure_lines)
}

fn orchestrator(
    root: &Path,
    config: &TriageConfig,
) -> Result<FlowOrchestrator<FsArtifactSource>, String> {
    Ok(FlowOrchestrator::new(artifact_source(root, config)?)
        .with_checker(checker(config))
        .with_analyzer(analyzer(config)))
}

/// Human formats get suggestions inline; structured formats keep stdout
/// parseable and send them to stderr.
fn print_suggestions(suggestions: &[String], format: OutputFormat) {
    if suggestions.is_empty() {
        return;
    }
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            for line in suggestions {
                eprintln!("{line}");
            }
        }
        OutputFormat::Markdown | OutputFormat::Table => {
            println!();
            for line in suggestions {
                println!("{line}");
            }
        }
    }
}
