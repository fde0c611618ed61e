//! Implementation of `rpdt map <generated> <reference>`.
//!
//! Runs reconciliation only and prints the identity map, which is what a
//! spec author needs when a comparison unexpectedly reports unmapped
//! objects.
//!
//! Output (human mode): one `CATEGORY  GENERATED -> REFERENCE` line per
//! pairing, grouped by category, then the warning and error blocks.
//! Output (JSON mode): `{"map": {...}, "findings": [...], "complete": bool}`.
//!
//! Exit codes: 0 = clean, 1 = reconciliation errors, 2 = input failure.
use std::io::Write;

use rpdt_core::{Category, Reconciliation, reconcile};

use crate::cmd::{Settings, stdout_error};
use crate::error::CliError;
use crate::format;
use crate::{OutputFormat, PathOrStdin, io};

/// Label used for the findings blocks.
const FINDINGS_LABEL: &str = "reconciliation";

/// Runs the `map` command.
///
/// # Errors
///
/// - [`CliError`] exit code 2 if either document cannot be loaded.
/// - [`CliError::FindingsHaveErrors`] if reconciliation raised errors.
pub fn run(
    generated: &PathOrStdin,
    reference: &PathOrStdin,
    settings: &Settings,
) -> Result<(), CliError> {
    if *generated == PathOrStdin::Stdin && *reference == PathOrStdin::Stdin {
        return Err(CliError::InvalidArgument {
            detail: "at most one input may be read from stdin".to_owned(),
        });
    }
    let generated = io::read_json(generated, settings.max_file_size)?;
    let reference = io::read_json(reference, settings.max_file_size)?;
    let result = reconcile(&generated, &reference);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match settings.formatter.format {
        OutputFormat::Human => {
            write_pairs(&mut out, &result)
                .and_then(|()| {
                    format::write_findings(
                        &mut out,
                        FINDINGS_LABEL,
                        &result.findings,
                        &settings.formatter,
                    )
                })
                .map_err(|e| stdout_error(&e))?;
        }
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&result).map_err(|e| CliError::IoError {
                source: "stdout".to_owned(),
                detail: e.to_string(),
            })?;
            writeln!(out, "{text}").map_err(|e| stdout_error(&e))?;
        }
    }

    let errors = result.findings.error_count();
    if errors > 0 {
        Err(CliError::FindingsHaveErrors { errors })
    } else {
        Ok(())
    }
}

fn write_pairs<W: Write>(w: &mut W, result: &Reconciliation) -> std::io::Result<()> {
    for category in Category::ALL {
        for (generated, reference) in result.map.iter_category(category) {
            writeln!(w, "{:<14}  {generated} -> {reference}", category.label())?;
        }
    }
    if !result.complete {
        writeln!(w, "(zones unresolved; later categories skipped)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn pairs_are_grouped_by_category() {
        let doc = json!({"ruleset_model_descriptions": [{
            "boilers": [{"id": "B1"}],
            "buildings": [{"building_segments": [{"zones": [{"id": "Z1"}]}]}]
        }]});
        let result = reconcile(&doc, &doc);
        let mut buf = Vec::new();
        write_pairs(&mut buf, &result).expect("write");
        let text = String::from_utf8(buf).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["Zones           Z1 -> Z1", "Boilers         B1 -> B1"]);
    }
}
