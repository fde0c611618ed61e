/// CLI error types with associated exit codes.
///
/// [`CliError`] is the top-level error type for the `rpdt` binary. Every
/// variant maps to a stable exit code (1 or 2) via [`CliError::exit_code`]:
///
/// - Exit code **2**: input failure. A file, spec or manifest could not be
///   read or parsed.
/// - Exit code **1**: the run completed but produced error-level findings,
///   or an auxiliary command found nothing.
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CliError
// ---------------------------------------------------------------------------

/// All error conditions that the `rpdt` CLI can produce.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: input failures ---
    /// A file argument could not be found on the filesystem.
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The process lacks permission to read a file.
    PermissionDenied {
        /// The path that could not be read.
        path: PathBuf,
    },

    /// The input exceeds the configured `--max-file-size` limit.
    FileTooLarge {
        /// `"-"` for stdin, otherwise the filesystem path.
        source: String,
        /// The configured size limit in bytes.
        limit: u64,
        /// The actual size in bytes; `None` for stdin.
        actual: Option<u64>,
    },

    /// The input bytes are not valid UTF-8.
    InvalidUtf8 {
        source: String,
        /// The byte offset of the first invalid byte sequence.
        byte_offset: usize,
    },

    /// An I/O error occurred while reading from stdin.
    StdinReadError { detail: String },

    /// A generic I/O error not covered by the more specific variants above.
    IoError { source: String, detail: String },

    /// An input is not well-formed JSON.
    ParseFailed { source: String, detail: String },

    /// A comparison spec could not be turned into test entries.
    InvalidSpec { source: String, detail: String },

    /// The run manifest is malformed.
    InvalidManifest { detail: String },

    /// Arguments that clap accepts but that cannot be honoured together.
    InvalidArgument { detail: String },

    /// Some manifest cases could not be loaded. The others ran and the
    /// report was written.
    CasesSkipped { skipped: usize },

    // --- Exit code 1: logical failures ---
    /// At least one test case produced error-level findings.
    ///
    /// The findings have already been printed.
    FindingsHaveErrors {
        /// Total number of error findings across the run.
        errors: usize,
    },

    /// A query or mapping command produced nothing.
    NoResults { detail: String },
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::FileTooLarge { .. }
            | Self::InvalidUtf8 { .. }
            | Self::StdinReadError { .. }
            | Self::IoError { .. }
            | Self::ParseFailed { .. }
            | Self::InvalidSpec { .. }
            | Self::InvalidManifest { .. }
            | Self::InvalidArgument { .. }
            | Self::CasesSkipped { .. } => 2,

            Self::FindingsHaveErrors { .. } | Self::NoResults { .. } => 1,
        }
    }

    /// Returns a human-readable error message suitable for printing to stderr.
    pub fn message(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("error: file not found: {}", path.display())
            }
            Self::PermissionDenied { path } => {
                format!("error: permission denied: {}", path.display())
            }
            Self::FileTooLarge {
                source,
                limit,
                actual: Some(actual),
            } => {
                format!("error: file too large: {source} is {actual} bytes, limit is {limit} bytes")
            }
            Self::FileTooLarge {
                source,
                limit,
                actual: None,
            } => {
                format!("error: file too large: {source} exceeded limit of {limit} bytes")
            }
            Self::InvalidUtf8 {
                source,
                byte_offset,
            } => {
                format!(
                    "error: invalid UTF-8 in {source}: first invalid byte at offset {byte_offset}"
                )
            }
            Self::StdinReadError { detail } => {
                format!("error: failed to read stdin: {detail}")
            }
            Self::IoError { source, detail } => {
                format!("error: I/O error on {source}: {detail}")
            }
            Self::ParseFailed { source, detail } => {
                format!("error: invalid JSON in {source}: {detail}")
            }
            Self::InvalidSpec { source, detail } => {
                format!("error: invalid comparison spec {source}: {detail}")
            }
            Self::InvalidManifest { detail } => {
                format!("error: invalid run manifest: {detail}")
            }
            Self::InvalidArgument { detail } => format!("error: {detail}"),
            Self::CasesSkipped { skipped } => {
                format!("error: {skipped} test case(s) could not be loaded and were skipped")
            }
            Self::FindingsHaveErrors { errors } => {
                format!("error: run finished with {errors} error finding(s)")
            }
            Self::NoResults { detail } => format!("error: {detail}"),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
