//! Implementation of `rpdt query <file> <path>`.
//!
//! Evaluates a path query against a JSON document, the same way spec entries
//! are evaluated, and prints what it selects.
//!
//! Output (human mode): each match as pretty JSON, separated by blank lines.
//! Output (JSON mode): one JSON array of all matches.
//! Output (`--count`): just the number of matches.
//!
//! Exit codes: 0 = at least one match, 1 = no matches, 2 = input failure.
use std::io::Write;

use rpdt_core::PathQuery;
use serde_json::Value;

use crate::cmd::{Settings, stdout_error};
use crate::error::CliError;
use crate::{OutputFormat, PathOrStdin, io};

/// Runs the `query` command.
///
/// # Errors
///
/// - [`CliError`] exit code 2 if the document cannot be loaded.
/// - [`CliError::NoResults`] if the query selects nothing.
pub fn run(
    file: &PathOrStdin,
    path: &str,
    count: bool,
    settings: &Settings,
) -> Result<(), CliError> {
    let document = io::read_json(file, settings.max_file_size)?;
    let query = PathQuery::parse(path);
    let matches = query.evaluate(&document);

    if matches.is_empty() {
        return Err(CliError::NoResults {
            detail: format!("no values matched '{path}'"),
        });
    }
    if !settings.formatter.quiet {
        eprintln!("matched: {} value(s) for {query}", matches.len());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if count {
        return writeln!(out, "{}", matches.len()).map_err(|e| stdout_error(&e));
    }
    write_matches(&mut out, &matches, settings.formatter.format)
        .map_err(|e| stdout_error(&e))?;
    out.flush().map_err(|e| stdout_error(&e))
}

fn write_matches<W: Write>(
    w: &mut W,
    matches: &[&Value],
    format: OutputFormat,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Human => {
            for (i, value) in matches.iter().enumerate() {
                if i > 0 {
                    writeln!(w)?;
                }
                let text = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
                writeln!(w, "{text}")?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            let text = serde_json::to_string(matches).map_err(std::io::Error::other)?;
            writeln!(w, "{text}")
        }
    }
}
