#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(clippy::wildcard_enum_match_arm)]

use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use super::*;

/// The root help output must contain all top-level subcommand names.
#[test]
fn test_root_help_lists_all_subcommands() {
    let mut cmd = Cli::command();
    let help = format!("{}", cmd.render_help());
    for name in ["compare", "run", "query", "map"] {
        assert!(
            help.contains(name),
            "root help should mention subcommand '{name}'"
        );
    }
}

/// The root help output must describe every global flag.
#[test]
fn test_root_help_lists_global_flags() {
    let mut cmd = Cli::command();
    let help = format!("{}", cmd.render_help());

    let expected_flags = [
        "--format",
        "--quiet",
        "--verbose",
        "--max-file-size",
        "--no-color",
        "--output",
        "--help",
        "--version",
    ];
    for flag in &expected_flags {
        assert!(
            help.contains(flag),
            "root help should mention flag '{flag}'"
        );
    }
}

/// `rpdt compare --help` must mention its positional arguments and options.
#[test]
fn test_compare_help() {
    let mut cmd = Cli::command();
    let sub = cmd
        .find_subcommand_mut("compare")
        .expect("compare subcommand should exist");
    let help = format!("{}", sub.render_help());
    for needle in [
        "SPEC",
        "GENERATED",
        "REFERENCE",
        "--test-id",
        "--file-utilized",
        "--metadata",
    ] {
        assert!(help.contains(needle), "compare help should mention {needle}");
    }
}

/// `rpdt query --help` must mention `PATH` and `--count`.
#[test]
fn test_query_help() {
    let mut cmd = Cli::command();
    let sub = cmd
        .find_subcommand_mut("query")
        .expect("query subcommand should exist");
    let help = format!("{}", sub.render_help());
    assert!(help.contains("PATH"), "query help should mention PATH");
    assert!(help.contains("--count"), "query help should mention --count");
}

/// `compare` takes exactly three inputs.
#[test]
fn test_compare_requires_three_inputs() {
    let result = Cli::try_parse_from(["rpdt", "compare", "spec.json", "gen.json"]);
    assert!(result.is_err(), "compare with two inputs should fail");
}

/// Repeated `--file-utilized` flags collect in order.
#[test]
fn test_compare_collects_files_utilized() {
    let cli = Cli::try_parse_from([
        "rpdt",
        "compare",
        "spec.json",
        "gen.json",
        "ref.json",
        "--file-utilized",
        "a.csv",
        "--file-utilized",
        "b.idf",
        "--test-id",
        "12-1",
    ])
    .expect("should parse compare");
    match cli.command {
        Command::Compare {
            files_utilized,
            test_id,
            metadata,
            ..
        } => {
            assert_eq!(files_utilized, vec!["a.csv", "b.idf"]);
            assert_eq!(test_id.as_deref(), Some("12-1"));
            assert!(metadata.is_none());
        }
        _ => panic!("expected Compare subcommand"),
    }
}

/// Parsing `-` should produce `PathOrStdin::Stdin`.
#[test]
fn test_path_or_stdin_parses_dash_as_stdin() {
    let cli = Cli::try_parse_from(["rpdt", "query", "-", "$.id"]).expect("should parse query -");
    match cli.command {
        Command::Query { file, path, count } => {
            assert_eq!(file, PathOrStdin::Stdin);
            assert_eq!(path, "$.id");
            assert!(!count);
        }
        _ => panic!("expected Query subcommand"),
    }
}

/// Parsing a real path should produce `PathOrStdin::Path`.
#[test]
fn test_path_or_stdin_parses_real_path() {
    let cli = Cli::try_parse_from(["rpdt", "map", "models/gen.json", "ref.json"])
        .expect("should parse map");
    match cli.command {
        Command::Map {
            generated,
            reference,
        } => {
            assert_eq!(generated, PathOrStdin::Path(PathBuf::from("models/gen.json")));
            assert_eq!(generated.file_name(), "gen.json");
            assert_eq!(reference.label(), "ref.json");
        }
        _ => panic!("expected Map subcommand"),
    }
}

/// `--quiet` and `--verbose` must conflict with each other.
#[test]
fn test_quiet_verbose_conflict() {
    let result = Cli::try_parse_from(["rpdt", "--quiet", "--verbose", "run", "m.json"]);
    assert!(result.is_err(), "--quiet and --verbose should conflict");
}

/// `--max-file-size` CLI flag overrides the default.
#[test]
fn test_max_file_size_cli_override() {
    let cli = Cli::try_parse_from(["rpdt", "--max-file-size", "1048576", "run", "m.json"])
        .expect("should parse with --max-file-size");
    assert_eq!(cli.max_file_size, 1_048_576);
}

/// `--format json` should parse to `OutputFormat::Json`; flags are global.
#[test]
fn test_format_flag_after_subcommand() {
    let cli = Cli::try_parse_from(["rpdt", "run", "m.json", "--format", "json"])
        .expect("should parse --format after the subcommand");
    assert_eq!(cli.format, OutputFormat::Json);
}

/// `--output` overrides where the report goes.
#[test]
fn test_output_flag_override() {
    let cli = Cli::try_parse_from(["rpdt", "-o", "out/report.json", "run", "m.json"])
        .expect("should parse -o");
    assert_eq!(cli.output, PathBuf::from("out/report.json"));
}

/// clap's internal consistency check must pass for the full command tree.
#[test]
fn test_cli_debug_assert() {
    Cli::command().debug_assert();
}
