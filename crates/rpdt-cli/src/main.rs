mod cli;
mod cmd;
mod error;
mod format;
mod io;
mod logging;
mod manifest;

use clap::Parser;

pub use cli::{Cli, Command, OutputFormat, PathOrStdin};

use crate::cmd::Settings;
use crate::error::CliError;
use crate::format::FormatterConfig;

fn main() {
    let cli = Cli::parse();
    let formatter = FormatterConfig::from_flags(cli.format, cli.no_color, cli.quiet, cli.verbose);
    logging::init(cli.quiet, cli.verbose, formatter.colors);

    let settings = Settings {
        formatter,
        max_file_size: cli.max_file_size,
        output: cli.output,
    };

    if let Err(e) = dispatch(cli.command, &settings) {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}

fn dispatch(command: Command, settings: &Settings) -> Result<(), CliError> {
    match command {
        Command::Compare {
            spec,
            generated,
            reference,
            test_id,
            files_utilized,
            metadata,
        } => {
            let sources =
                cmd::compare::sources(spec, generated, reference, test_id, files_utilized);
            cmd::compare::run(sources, metadata.as_deref(), settings)
        }
        Command::Run { manifest } => cmd::run::run(&manifest, settings),
        Command::Query { file, path, count } => cmd::query::run(&file, &path, count, settings),
        Command::Map {
            generated,
            reference,
        } => cmd::map::run(&generated, &reference, settings),
    }
}
