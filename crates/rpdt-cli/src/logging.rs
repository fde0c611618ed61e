//! Diagnostic logging to stderr through `tracing-subscriber`.
//!
//! The filter comes from `RPDT_LOG` (any `EnvFilter` directive) and falls
//! back to `warn`. `--verbose` forces `debug`, `--quiet` forces `error`.
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "RPDT_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Picks the filter directive from the flags and the environment value.
fn directive(quiet: bool, verbose: bool, env: Option<&str>) -> String {
    if verbose {
        return "debug".to_owned();
    }
    if quiet {
        return "error".to_owned();
    }
    match env {
        Some(value) if EnvFilter::try_new(value).is_ok() => value.to_owned(),
        Some(_) | None => DEFAULT_DIRECTIVE.to_owned(),
    }
}

/// Installs the global subscriber. Call once, first thing in `main`.
pub fn init(quiet: bool, verbose: bool, colors: bool) {
    let env = std::env::var(LOG_ENV).ok();
    let filter = EnvFilter::new(directive(quiet, verbose, env.as_deref()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(colors)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment() {
        assert_eq!(directive(false, true, Some("error")), "debug");
        assert_eq!(directive(true, false, Some("trace")), "error");
    }

    #[test]
    fn environment_used_when_valid() {
        assert_eq!(directive(false, false, Some("rpdt_core=debug")), "rpdt_core=debug");
        assert_eq!(directive(false, false, None), "warn");
    }

    #[test]
    fn invalid_environment_falls_back() {
        assert_eq!(directive(false, false, Some("rpdt_core=loud")), "warn");
    }
}
