//! Implementation of `rpdt compare <spec> <generated> <reference>`.
//!
//! Runs a single test case: reconciles the two documents, grades every spec
//! entry, prints the warning and error blocks and writes the report to
//! `--output`.
//!
//! Exit codes: 0 = no error findings, 1 = error findings, 2 = input failure.
use std::path::{Path, PathBuf};

use rpdt_core::RunMetadata;

use crate::PathOrStdin;
use crate::cmd::{CaseSources, Settings, execute};
use crate::error::CliError;
use crate::io;

/// Test id used when `--test-id` is absent and the spec came from stdin.
const STDIN_TEST_ID: &str = "stdin";

/// Runs the `compare` command.
///
/// # Errors
///
/// - [`CliError`] exit code 2 if any input, the spec or the metadata file
///   cannot be loaded.
/// - [`CliError::FindingsHaveErrors`] if the comparison produced errors.
pub fn run(
    sources: CaseSources,
    metadata: Option<&Path>,
    settings: &Settings,
) -> Result<(), CliError> {
    let metadata = match metadata {
        Some(path) => load_metadata(path, settings.max_file_size)?,
        None => RunMetadata::default(),
    };
    let case = sources.load(settings.max_file_size)?;
    execute(metadata, &[Ok(case)], settings)
}

/// Builds the case sources, deriving the test id from the spec file stem
/// when none is given.
pub fn sources(
    spec: PathOrStdin,
    generated: PathOrStdin,
    reference: PathOrStdin,
    test_id: Option<String>,
    files_utilized: Vec<String>,
) -> CaseSources {
    let test_id = test_id.unwrap_or_else(|| default_test_id(&spec));
    CaseSources {
        test_id,
        spec,
        generated,
        reference,
        files_utilized,
    }
}

fn default_test_id(spec: &PathOrStdin) -> String {
    match spec {
        PathOrStdin::Stdin => STDIN_TEST_ID.to_owned(),
        PathOrStdin::Path(path) => path
            .file_stem()
            .map_or_else(|| spec.label(), |stem| stem.to_string_lossy().into_owned()),
    }
}

/// Reads a run-metadata object; absent fields default to empty.
fn load_metadata(path: &Path, max_file_size: u64) -> Result<RunMetadata, CliError> {
    let source = PathOrStdin::Path(PathBuf::from(path));
    let value = io::read_json(&source, max_file_size)?;
    serde_json::from_value(value).map_err(|e| CliError::ParseFailed {
        source: source.label(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::io::Write as _;

    use super::*;

    #[test]
    fn test_id_defaults_to_spec_stem() {
        let s = sources(
            "specs/12-1.json".parse().expect("infallible"),
            PathOrStdin::Stdin,
            "ref.json".parse().expect("infallible"),
            None,
            Vec::new(),
        );
        assert_eq!(s.test_id, "12-1");
    }

    #[test]
    fn explicit_test_id_wins() {
        let s = sources(
            PathOrStdin::Stdin,
            "gen.json".parse().expect("infallible"),
            "ref.json".parse().expect("infallible"),
            Some("custom".to_owned()),
            vec!["a.idf".to_owned()],
        );
        assert_eq!(s.test_id, "custom");
        assert_eq!(s.files_utilized, vec!["a.idf"]);
        assert_eq!(default_test_id(&PathOrStdin::Stdin), "stdin");
    }

    #[test]
    fn metadata_fields_default_to_empty() {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(br#"{"ruleset_name": "ASHRAE 90.1-2019"}"#)
            .expect("write");
        let metadata = load_metadata(f.path(), 1024).expect("valid metadata");
        assert_eq!(metadata.ruleset_name, "ASHRAE 90.1-2019");
        assert_eq!(metadata.generation_software_name, "");
    }

    #[test]
    fn metadata_must_be_an_object() {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(b"[1, 2]").expect("write");
        let err = load_metadata(f.path(), 1024).expect_err("not an object");
        assert!(matches!(err, CliError::ParseFailed { .. }));
    }
}
