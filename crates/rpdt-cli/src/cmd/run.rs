//! Implementation of `rpdt run <manifest>`.
//!
//! Runs every test case listed in the manifest, in order, into one report.
//! A case whose spec or documents cannot be loaded is skipped and the run
//! continues with the next one.
//!
//! Exit codes: 0 = no error findings, 1 = error findings, 2 = input failure
//! (a bad manifest, or at least one skipped case).
use std::path::Path;

use tracing::info;

use crate::PathOrStdin;
use crate::cmd::{CaseSources, LoadedCase, Settings, SkippedCase, execute};
use crate::error::CliError;
use crate::io;
use crate::manifest::{Manifest, ManifestCase};

/// Runs the `run` command.
///
/// # Errors
///
/// - [`CliError`] exit code 2 if the manifest cannot be loaded.
/// - [`CliError::CasesSkipped`] if any listed case could not be loaded.
/// - [`CliError::FindingsHaveErrors`] if any case produced errors.
pub fn run(manifest_path: &Path, settings: &Settings) -> Result<(), CliError> {
    let manifest = load_manifest(manifest_path, settings.max_file_size)?;
    info!(
        manifest = %manifest_path.display(),
        test_cases = manifest.test_cases.len(),
        "manifest loaded"
    );

    let cases: Vec<Result<LoadedCase, SkippedCase>> = manifest
        .test_cases
        .into_iter()
        .map(|case| {
            let test_id = case.test_id.clone();
            sources(case)
                .load(settings.max_file_size)
                .map_err(|error| SkippedCase { test_id, error })
        })
        .collect();
    execute(manifest.metadata, &cases, settings)
}

fn load_manifest(path: &Path, max_file_size: u64) -> Result<Manifest, CliError> {
    let text = io::read_input(&PathOrStdin::Path(path.to_path_buf()), max_file_size)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    Manifest::parse(&text, base_dir)
}

fn sources(case: ManifestCase) -> CaseSources {
    CaseSources {
        test_id: case.test_id,
        spec: PathOrStdin::Path(case.spec),
        generated: PathOrStdin::Path(case.generated),
        reference: PathOrStdin::Path(case.reference),
        files_utilized: case.files_utilized,
    }
}
