//! Output formatting for reports and analyses.

use serde::Serialize;
use suite_triage_core::{DeclarationKind, DuplicationReport, FailureAnalysis, PreCheckReport};

use crate::failure::OutputAnalysis;
use crate::flow::PipelineRun;
use crate::runner::BuildSummary;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

/// Build summary and failure-line analyses of one test-run output.
#[derive(Debug, Serialize)]
struct OutputReport<'a> {
    build: &'a BuildSummary,
    #[serde(flatten)]
    analysis: &'a OutputAnalysis,
}

fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> Option<Result<String, String>> {
    match format {
        OutputFormat::Json => Some(
            serde_json::to_string_pretty(value)
                .map_err(|e| format!("JSON serialization failed: {e}")),
        ),
        OutputFormat::Yaml => Some(
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}")),
        ),
        OutputFormat::Markdown | OutputFormat::Table => None,
    }
}

/// Formats a pre-check report in the requested output format.
pub fn format_precheck(report: &PreCheckReport, format: OutputFormat) -> Result<String, String> {
    if let Some(result) = serialize(report, format) {
        return result;
    }
    Ok(match format {
        OutputFormat::Markdown => precheck_to_markdown(report),
        _ => precheck_to_table(report),
    })
}

/// Formats a single duplication report.
pub fn format_duplication(
    report: &DuplicationReport,
    format: OutputFormat,
) -> Result<String, String> {
    if let Some(result) = serialize(report, format) {
        return result;
    }
    Ok(match format {
        OutputFormat::Markdown => duplication_to_markdown(report, "##"),
        _ => duplication_to_table(report),
    })
}

/// Formats a failure analysis.
pub fn format_analysis(analysis: &FailureAnalysis, format: OutputFormat) -> Result<String, String> {
    if let Some(result) = serialize(analysis, format) {
        return result;
    }
    Ok(match format {
        OutputFormat::Markdown => analysis_to_markdown(analysis),
        _ => analysis_to_table(analysis),
    })
}

/// Formats a build summary together with its failure-line analyses.
pub fn format_output_analysis(
    build: &BuildSummary,
    analysis: &OutputAnalysis,
    format: OutputFormat,
) -> Result<String, String> {
    if let Some(result) = serialize(&OutputReport { build, analysis }, format) {
        return result;
    }
    let mut out = match format {
        OutputFormat::Markdown => format!("# Test Output\n\n{}\n", build_to_line(build)),
        _ => format!("{}\n", build_to_line(build)),
    };
    out.push_str(&output_analysis_body(analysis, format));
    Ok(out)
}

/// Formats a finished pipeline run.
pub fn format_run(run: &PipelineRun, format: OutputFormat) -> Result<String, String> {
    if let Some(result) = serialize(run, format) {
        return result;
    }

    let markdown = format == OutputFormat::Markdown;
    let history: Vec<&str> = run.history.iter().map(|s| s.as_str()).collect();
    let mut out = if markdown {
        format!("# Pipeline Run\n\n- **State:** {}\n- **History:** {}\n", run.state, history.join(" -> "))
    } else {
        format!("State: {}  ({})\n", run.state, history.join(" -> "))
    };

    if let Some(passed) = run.tests_passed {
        let verdict = if passed { "passed" } else { "failed" };
        if markdown {
            out.push_str(&format!("- **Tests:** {verdict}\n"));
        } else {
            out.push_str(&format!("Tests: {verdict}\n"));
        }
    }
    if let Some(ref build) = run.build {
        out.push_str(&build_to_line(build));
        out.push('\n');
    }
    if let Some(ref precheck) = run.precheck {
        out.push('\n');
        out.push_str(&if markdown {
            precheck_to_markdown(precheck)
        } else {
            precheck_to_table(precheck)
        });
    }
    if let Some(ref analysis) = run.test_output {
        out.push('\n');
        out.push_str(&output_analysis_body(analysis, format));
    }

    Ok(out)
}

fn precheck_to_markdown(report: &PreCheckReport) -> String {
    let mut out = String::new();

    out.push_str("# Pre-Execution Check\n\n");
    out.push_str(&format!(
        "- **Ready to execute:** {}\n",
        if report.ready_to_execute { "yes" } else { "no" }
    ));
    out.push_str(&format!("- **Timestamp:** {}\n", report.timestamp));

    if !report.issues.is_empty() {
        out.push_str("\n## Issues\n\n");
        for issue in &report.issues {
            out.push_str(&format!("- {issue}\n"));
        }
    }

    out.push('\n');
    out.push_str(&duplication_to_markdown(&report.duplication_check, "##"));
    out.push('\n');
    out.push_str(&duplication_to_markdown(&report.step_integrity, "##"));
    out
}

fn precheck_to_table(report: &PreCheckReport) -> String {
    let mut out = String::new();
    let status = if report.ready_to_execute {
        "READY"
    } else {
        "BLOCKED"
    };
    out.push_str(&format!("Pre-check: {status}\n"));
    for issue in &report.issues {
        out.push_str(&format!("  ! {issue}\n"));
    }
    out.push_str(&duplication_to_table(&report.duplication_check));
    out.push_str(&duplication_to_table(&report.step_integrity));
    out
}

fn duplication_to_markdown(report: &DuplicationReport, heading: &str) -> String {
    let mut out = String::new();

    let title = match report.kind {
        DeclarationKind::Locator => "Locator Duplication",
        DeclarationKind::Step => "Step Duplication",
    };
    out.push_str(&format!("{heading} {title}\n\n"));
    out.push_str(&format!("- **Declarations:** {}\n", report.total_count));
    out.push_str(&format!(
        "- **Duplicate groups:** {}\n",
        report.duplicate_groups.len()
    ));
    out.push_str(&format!(
        "- **Duplication:** {:.1}%\n",
        report.duplication_percentage
    ));
    if report.skipped_lines > 0 {
        out.push_str(&format!("- **Skipped lines:** {}\n", report.skipped_lines));
    }

    if report.has_duplicates() {
        out.push_str("\n| Value | Count | Locations |\n");
        out.push_str("|-------|-------|-----------|\n");
        for group in &report.duplicate_groups {
            let locations: Vec<String> = group
                .occurrences
                .iter()
                .map(|o| escape_cell(&o.location()))
                .collect();
            out.push_str(&format!(
                "| `{}` | {} | {} |\n",
                escape_cell(&group.normalized_key),
                group.count(),
                locations.join("<br>")
            ));
        }
    }

    if !report.read_errors.is_empty() {
        out.push_str("\n**Read errors:**\n\n");
        for err in &report.read_errors {
            out.push_str(&format!("- {err}\n"));
        }
    }

    out
}

/// Keeps a value inside one Markdown table cell.
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

fn duplication_to_table(report: &DuplicationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<8} total={:<5} groups={:<4} dup={:.1}%",
        report.kind.to_string(),
        report.total_count,
        report.duplicate_groups.len(),
        report.duplication_percentage,
    ));
    if report.skipped_lines > 0 {
        out.push_str(&format!("  skipped={}", report.skipped_lines));
    }
    out.push('\n');

    for group in &report.duplicate_groups {
        out.push_str(&format!("  {} (x{})\n", group.normalized_key, group.count()));
        for occurrence in &group.occurrences {
            out.push_str(&format!("    {}\n", occurrence.location()));
        }
    }
    for err in &report.read_errors {
        out.push_str(&format!("  ! {err}\n"));
    }
    out
}

fn analysis_to_markdown(analysis: &FailureAnalysis) -> String {
    let mut out = String::new();

    out.push_str("# Failure Analysis\n\n");
    out.push_str(&format!(
        "- **Error type:** {}\n",
        analysis.error_type.as_deref().unwrap_or("unclassified")
    ));
    if let Some(ref cause) = analysis.cause {
        out.push_str(&format!("- **Cause:** {cause}\n"));
    }
    out.push_str(&format!("- **Severity:** {}\n", analysis.severity));

    if !analysis.fixes.is_empty() {
        out.push_str("\n## Fixes\n\n");
        for fix in &analysis.fixes {
            out.push_str(&format!("- {fix}\n"));
        }
    }
    if !analysis.recommended_actions.is_empty() {
        out.push_str("\n## Recommended Actions\n\n");
        for action in &analysis.recommended_actions {
            out.push_str(&format!("{action}\n"));
        }
    }

    out
}

fn analysis_to_table(analysis: &FailureAnalysis) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<32} {:<8}",
        analysis.error_type.as_deref().unwrap_or("unclassified"),
        analysis.severity.as_str(),
    ));
    if let Some(ref cause) = analysis.cause {
        out.push_str(&format!("  {cause}"));
    }
    out.push('\n');
    for fix in &analysis.fixes {
        out.push_str(&format!("  - {fix}\n"));
    }
    out
}

fn build_to_line(build: &BuildSummary) -> String {
    let count = |n: Option<u32>| n.map_or_else(|| "?".to_string(), |n| n.to_string());
    format!(
        "Build: {}  tests={} failures={} errors={} skipped={}",
        if build.build_success { "SUCCESS" } else { "FAILURE" },
        count(build.tests_run),
        count(build.failures),
        count(build.errors),
        count(build.skipped),
    )
}

fn output_analysis_body(analysis: &OutputAnalysis, format: OutputFormat) -> String {
    let mut out = String::new();
    if analysis.all_passed() {
        out.push_str("No failure indicators found.\n");
        return out;
    }

    out.push_str(&format!(
        "Failure lines: {} (analyzed {})\n",
        analysis.failure_line_count,
        analysis.analyzed.len()
    ));
    for entry in &analysis.analyzed {
        out.push('\n');
        if format == OutputFormat::Markdown {
            out.push_str(&format!("> `{}`\n\n", entry.line));
            out.push_str(&analysis_to_markdown(&entry.analysis).replacen("# ", "## ", 1));
        } else {
            out.push_str(&format!("{}\n", entry.line));
            out.push_str(&analysis_to_table(&entry.analysis));
        }
    }
    out
}
