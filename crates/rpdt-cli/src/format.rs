/// Console output for findings and run summaries: human-readable and JSON
/// (NDJSON) modes.
///
/// - **Human mode** (default): per test case, a warnings block then an
///   errors block, each a flat list of lines under a banner naming the test.
///   Banners are colored when colors are enabled.
/// - **JSON mode**: one single-line JSON object per finding.
///
/// Findings are written to stdout. Summaries and timing go to stderr.
/// **Quiet** drops warnings and summaries; **verbose** adds timing.
use std::io::{IsTerminal as _, Write};
use std::time::Duration;

use rpdt_core::{Findings, Severity, Tally};
use serde_json::json;

use crate::OutputFormat;

// ---------------------------------------------------------------------------
// Color support detection
// ---------------------------------------------------------------------------

/// Returns `true` if ANSI color codes should be emitted.
///
/// Colors are off when `--no-color` is passed, when `NO_COLOR` is set, or
/// when stdout is not a TTY.
pub fn colors_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

const ANSI_RED: &str = "\x1b[31m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_RESET: &str = "\x1b[0m";

const RULE: &str = "----------------------------";

// ---------------------------------------------------------------------------
// FormatterConfig
// ---------------------------------------------------------------------------

/// Configuration for console output, derived from CLI flags.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    pub format: OutputFormat,
    /// Whether ANSI colors are enabled.
    pub colors: bool,
    /// Only print error findings.
    pub quiet: bool,
    /// Print timing to stderr.
    pub verbose: bool,
}

impl FormatterConfig {
    /// Constructs a [`FormatterConfig`] from the raw CLI flags.
    pub fn from_flags(format: OutputFormat, no_color_flag: bool, quiet: bool, verbose: bool) -> Self {
        Self {
            format,
            colors: colors_enabled(no_color_flag),
            quiet,
            verbose,
        }
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// Writes the findings of one test case in the configured format.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_findings<W: Write>(
    writer: &mut W,
    test_id: &str,
    findings: &Findings,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    match config.format {
        OutputFormat::Human => write_findings_human(writer, test_id, findings, config),
        OutputFormat::Json => write_findings_json(writer, test_id, findings, config),
    }
}

/// Human mode: a warnings block followed by an errors block.
///
/// ```text
/// ----------------------------
///     Warnings for 12-1:
/// ----------------------------
/// Missing key volume
/// ```
///
/// Empty blocks are omitted entirely.
fn write_findings_human<W: Write>(
    writer: &mut W,
    test_id: &str,
    findings: &Findings,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if !config.quiet && findings.warning_count() > 0 {
        write_banner(writer, &format!("Warnings for {test_id}:"), ANSI_YELLOW, config)?;
        for warning in findings.warnings() {
            writeln!(writer, "{}", warning.message)?;
        }
    }
    if findings.has_errors() {
        write_banner(writer, &format!("Errors for {test_id}:"), ANSI_RED, config)?;
        for error in findings.errors() {
            writeln!(writer, "{}", error.message)?;
        }
    }
    Ok(())
}

fn write_banner<W: Write>(
    writer: &mut W,
    title: &str,
    color: &str,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    writeln!(writer, "{RULE}")?;
    if config.colors {
        writeln!(writer, "    {color}{title}{ANSI_RESET}")?;
    } else {
        writeln!(writer, "    {title}")?;
    }
    writeln!(writer, "{RULE}")
}

/// JSON mode: one object per finding.
///
/// ```json
/// {"test_id":"12-1","severity":"error","message":"..."}
/// ```
fn write_findings_json<W: Write>(
    writer: &mut W,
    test_id: &str,
    findings: &Findings,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    for finding in findings.iter() {
        let suppressed = match finding.severity {
            Severity::Warning => config.quiet,
            Severity::Error => false,
        };
        if suppressed {
            continue;
        }
        let line = json!({
            "test_id": test_id,
            "severity": finding.severity,
            "message": finding.message,
        });
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub test_cases: usize,
    pub tally: Tally,
    pub errors: usize,
    pub warnings: usize,
}

/// Writes the run summary in the configured format. Suppressed in quiet mode.
///
/// Human format:
/// `2 test cases: 14 matched, 1 differed, 3 not implemented; 1 error, 5 warnings`
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_summary<W: Write>(
    writer: &mut W,
    summary: &RunSummary,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if config.quiet {
        return Ok(());
    }
    match config.format {
        OutputFormat::Human => writeln!(
            writer,
            "{} {}: {} matched, {} differed, {} not implemented; {} {}, {} {}",
            summary.test_cases,
            pluralize(summary.test_cases, "test case", "test cases"),
            summary.tally.matched,
            summary.tally.differ,
            summary.tally.not_implemented,
            summary.errors,
            pluralize(summary.errors, "error", "errors"),
            summary.warnings,
            pluralize(summary.warnings, "warning", "warnings"),
        ),
        OutputFormat::Json => {
            let line = json!({"summary": {
                "test_cases": summary.test_cases,
                "tally": summary.tally,
                "errors": summary.errors,
                "warnings": summary.warnings,
            }});
            writeln!(writer, "{line}")
        }
    }
}

/// Writes timing information in verbose mode; a no-op otherwise.
///
/// # Errors
///
/// Returns an error only if writing to `writer` fails.
pub fn write_timing<W: Write>(
    writer: &mut W,
    label: &str,
    duration: Duration,
    config: &FormatterConfig,
) -> std::io::Result<()> {
    if !config.verbose {
        return Ok(());
    }
    writeln!(writer, "{label} in {}ms", duration.as_millis())
}

/// Returns the singular or plural form of `word` depending on `count`.
fn pluralize<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
