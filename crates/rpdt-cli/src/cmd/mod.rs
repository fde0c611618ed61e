/// Command module for the `rpdt` CLI.
///
/// Each submodule implements one subcommand. The `run` function in each
/// module takes the parsed arguments and returns `Ok(())` on success or
/// a [`crate::error::CliError`] on failure.
pub mod compare;
pub mod map;
pub mod query;
pub mod run;

use std::io::Write as _;
use std::path::PathBuf;
use std::time::Instant;

use rpdt_core::{ComparisonSpec, RunMetadata, RunReport, TestCase, run_test_case};
use serde_json::Value;
use tracing::{info, warn};

use crate::PathOrStdin;
use crate::error::CliError;
use crate::format::{self, FormatterConfig, RunSummary};
use crate::io;

/// Global settings every command receives.
#[derive(Debug, Clone)]
pub struct Settings {
    pub formatter: FormatterConfig,
    pub max_file_size: u64,
    /// Report destination for `compare` and `run`.
    pub output: PathBuf,
}

/// One test case with its spec and both documents parsed.
#[derive(Debug, Clone)]
pub struct LoadedCase {
    pub test_id: String,
    pub generated_file_name: String,
    pub files_utilized: Vec<String>,
    pub spec: ComparisonSpec,
    pub generated: Value,
    pub reference: Value,
}

/// A manifest case that could not be loaded, kept so the run can report it
/// and move on to the next case.
#[derive(Debug)]
pub struct SkippedCase {
    pub test_id: String,
    pub error: CliError,
}

/// Paths making up one test case, before loading.
#[derive(Debug, Clone)]
pub struct CaseSources {
    pub test_id: String,
    pub spec: PathOrStdin,
    pub generated: PathOrStdin,
    pub reference: PathOrStdin,
    pub files_utilized: Vec<String>,
}

impl CaseSources {
    /// Reads and parses the spec and both documents.
    ///
    /// # Errors
    ///
    /// Any read or parse failure, and [`CliError::InvalidSpec`] when the
    /// spec names an unknown special case or carries a malformed payload.
    pub fn load(self, max_file_size: u64) -> Result<LoadedCase, CliError> {
        let stdin_uses = [&self.spec, &self.generated, &self.reference]
            .into_iter()
            .filter(|source| **source == PathOrStdin::Stdin)
            .count();
        if stdin_uses > 1 {
            return Err(CliError::InvalidArgument {
                detail: "at most one input may be read from stdin".to_owned(),
            });
        }

        let spec_value = io::read_json(&self.spec, max_file_size)?;
        let spec = ComparisonSpec::from_value(spec_value).map_err(|e| CliError::InvalidSpec {
            source: self.spec.label(),
            detail: e.to_string(),
        })?;
        let generated = io::read_json(&self.generated, max_file_size)?;
        let reference = io::read_json(&self.reference, max_file_size)?;
        Ok(LoadedCase {
            test_id: self.test_id,
            generated_file_name: self.generated.file_name(),
            files_utilized: self.files_utilized,
            spec,
            generated,
            reference,
        })
    }
}

impl LoadedCase {
    fn as_test_case(&self) -> TestCase<'_> {
        TestCase {
            test_id: &self.test_id,
            generated_file_name: &self.generated_file_name,
            files_utilized: &self.files_utilized,
            spec: &self.spec,
            generated: &self.generated,
            reference: &self.reference,
        }
    }
}

/// Runs test cases in order, prints their findings, writes the report and
/// summarises.
///
/// A skipped case is announced on stderr and left out of the report. The
/// cases after it still run.
///
/// # Errors
///
/// - [`CliError::IoError`] if console output or the report write fails.
/// - [`CliError::CasesSkipped`] (exit 2) if any case could not be loaded.
///   The report of the remaining cases is still written.
/// - [`CliError::FindingsHaveErrors`] (exit 1) if any case produced an
///   error-level finding. The report is still written.
pub fn execute(
    metadata: RunMetadata,
    cases: &[Result<LoadedCase, SkippedCase>],
    settings: &Settings,
) -> Result<(), CliError> {
    let started = Instant::now();
    let mut report = RunReport::new(metadata);
    let mut summary = RunSummary::default();
    let mut skipped = 0;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for case in cases {
        let case = match case {
            Ok(case) => case,
            Err(skip) => {
                warn!(test_id = %skip.test_id, "test case skipped");
                eprintln!(
                    "{} (skipping test case '{}')",
                    skip.error.message(),
                    skip.test_id
                );
                skipped += 1;
                continue;
            }
        };
        let outcome = run_test_case(case.as_test_case());
        format::write_findings(&mut out, &case.test_id, &outcome.findings, &settings.formatter)
            .map_err(|e| stdout_error(&e))?;
        summary.test_cases += 1;
        summary.errors += outcome.findings.error_count();
        summary.warnings += outcome.findings.warning_count();
        report.push(outcome.report);
    }
    summary.tally = report.tally();

    io::write_json(&settings.output, &report)?;
    info!(output = %settings.output.display(), "report written");

    let stderr = std::io::stderr();
    let mut err = stderr.lock();
    format::write_summary(&mut err, &summary, &settings.formatter)
        .map_err(|e| stderr_error(&e))?;
    format::write_timing(&mut err, "ran test cases", started.elapsed(), &settings.formatter)
        .map_err(|e| stderr_error(&e))?;
    if !settings.formatter.quiet {
        writeln!(err, "results saved to {}", settings.output.display())
            .map_err(|e| stderr_error(&e))?;
    }

    if skipped > 0 {
        Err(CliError::CasesSkipped { skipped })
    } else if summary.errors > 0 {
        Err(CliError::FindingsHaveErrors {
            errors: summary.errors,
        })
    } else {
        Ok(())
    }
}

pub(crate) fn stdout_error(e: &std::io::Error) -> CliError {
    CliError::IoError {
        source: "stdout".to_owned(),
        detail: e.to_string(),
    }
}

pub(crate) fn stderr_error(e: &std::io::Error) -> CliError {
    CliError::IoError {
        source: "stderr".to_owned(),
        detail: e.to_string(),
    }
}
