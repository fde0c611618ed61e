//! Run manifest: the list of test cases `rpdt run` executes.
//!
//! ```json
//! {
//!   "metadata": {"ruleset_name": "ASHRAE 90.1-2019"},
//!   "test_cases": [
//!     {
//!       "test_id": "12-1",
//!       "spec": "specs/12-1.json",
//!       "generated": "out/12-1.json",
//!       "reference": "reference/12-1.json",
//!       "files_utilized": ["12-1.idf"]
//!     }
//!   ]
//! }
//! ```
//!
//! Relative paths resolve against the directory holding the manifest.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rpdt_core::RunMetadata;
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub metadata: RunMetadata,
    pub test_cases: Vec<ManifestCase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestCase {
    pub test_id: String,
    pub spec: PathBuf,
    pub generated: PathBuf,
    pub reference: PathBuf,
    #[serde(default)]
    pub files_utilized: Vec<String>,
}

impl Manifest {
    /// Parses manifest text, resolving case paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// [`CliError::InvalidManifest`] when the text is not a manifest, lists
    /// no test cases, or repeats a test id.
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self, CliError> {
        let mut manifest: Manifest =
            serde_json::from_str(text).map_err(|e| CliError::InvalidManifest {
                detail: e.to_string(),
            })?;
        if manifest.test_cases.is_empty() {
            return Err(CliError::InvalidManifest {
                detail: "no test cases listed".to_owned(),
            });
        }
        let mut seen = HashSet::new();
        for case in &mut manifest.test_cases {
            if !seen.insert(case.test_id.clone()) {
                return Err(CliError::InvalidManifest {
                    detail: format!("test id '{}' listed twice", case.test_id),
                });
            }
            case.spec = resolve(base_dir, &case.spec);
            case.generated = resolve(base_dir, &case.generated);
            case.reference = resolve(base_dir, &case.reference);
        }
        Ok(manifest)
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
