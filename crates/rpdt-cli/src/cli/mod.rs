//! Clap CLI definition: root struct, subcommands, and shared argument types.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// A CLI argument that is either a filesystem path or the stdin sentinel `"-"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathOrStdin {
    /// Read from standard input.
    Stdin,
    /// Read from the given filesystem path.
    Path(PathBuf),
}

impl PathOrStdin {
    /// Label used in messages and reports: `-` or the path as given.
    pub fn label(&self) -> String {
        match self {
            Self::Stdin => "-".to_owned(),
            Self::Path(path) => path.display().to_string(),
        }
    }

    /// The final path component, as recorded in `generated_file_name`.
    pub fn file_name(&self) -> String {
        match self {
            Self::Stdin => "-".to_owned(),
            Self::Path(path) => path
                .file_name()
                .map_or_else(|| self.label(), |name| name.to_string_lossy().into_owned()),
        }
    }
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(PathOrStdin::Stdin)
        } else {
            Ok(PathOrStdin::Path(PathBuf::from(s)))
        }
    }
}

/// Output format for CLI commands.
///
/// `Human` prints the warning and error blocks as plain text. `Json` prints
/// one JSON object per finding (NDJSON) and a JSON summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, optionally colored output (default).
    Human,
    /// Structured JSON / NDJSON output.
    Json,
}

/// All top-level subcommands exposed by the `rpdt` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Compare one generated document against its reference using a spec.
    Compare {
        /// Comparison spec listing the paths to test, or `-` for stdin.
        #[arg(value_name = "SPEC")]
        spec: PathOrStdin,
        /// Document produced by the software under test, or `-` for stdin.
        #[arg(value_name = "GENERATED")]
        generated: PathOrStdin,
        /// Reference document, or `-` for stdin.
        #[arg(value_name = "REFERENCE")]
        reference: PathOrStdin,
        /// Test case identifier written to the report (default: spec file stem).
        #[arg(long, value_name = "ID")]
        test_id: Option<String>,
        /// Auxiliary input file used to build the generated document (repeatable).
        #[arg(long = "file-utilized", value_name = "FILE")]
        files_utilized: Vec<String>,
        /// JSON object with run metadata (software and ruleset names).
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,
    },

    /// Run every test case listed in a run manifest.
    Run {
        /// Path to the manifest JSON file.
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },

    /// Evaluate a path query against a document and print the matches.
    Query {
        /// Path to a JSON document, or `-` for stdin.
        #[arg(value_name = "FILE")]
        file: PathOrStdin,
        /// Path query, e.g. `$.ruleset_model_descriptions[0].boilers[*].id`.
        #[arg(value_name = "PATH")]
        path: String,
        /// Print only the number of matches.
        #[arg(long)]
        count: bool,
    },

    /// Reconcile two documents and print the identity map.
    Map {
        /// Document produced by the software under test, or `-` for stdin.
        #[arg(value_name = "GENERATED")]
        generated: PathOrStdin,
        /// Reference document, or `-` for stdin.
        #[arg(value_name = "REFERENCE")]
        reference: PathOrStdin,
    },
}

/// Root CLI struct for the `rpdt` binary.
///
/// All global flags are defined here and marked `global = true` so that clap
/// propagates them to every subcommand.
#[derive(Parser)]
#[command(
    name = "rpdt",
    version,
    about = "Ruleset project description tester",
    long_about = "Verifies building energy model documents produced by modeling software\n\
                  against reference documents: reconciles entity ids between the two,\n\
                  compares the values named by a comparison spec and writes a JSON report."
)]
pub struct Cli {
    /// Active subcommand.
    #[command(subcommand)]
    pub command: Command,

    /// Output format: human (default) or json.
    #[arg(long, short = 'f', default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Suppress warnings and summaries; only errors are printed
    /// (incompatible with `--verbose`).
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log reconciliation and comparison detail to stderr
    /// (incompatible with `--quiet`).
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Maximum input file size in bytes.
    ///
    /// Can also be set via the `RPDT_MAX_FILE_SIZE` environment variable.
    /// The CLI flag takes precedence over the environment variable.
    /// Default: 268435456 (256 MB).
    #[arg(
        long,
        global = true,
        env = "RPDT_MAX_FILE_SIZE",
        default_value = "268435456"
    )]
    pub max_file_size: u64,

    /// Disable ANSI color codes in human output.
    ///
    /// Also respects the `NO_COLOR` environment variable per
    /// <https://no-color.org>.
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Where `compare` and `run` write the JSON report.
    #[arg(
        long,
        short = 'o',
        global = true,
        env = "RPDT_OUTPUT",
        default_value = "rpd_test_results.json",
        value_name = "FILE"
    )]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests;
