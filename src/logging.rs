//! Logging setup for the CLI.
//!
//! Diagnostics go to stderr through `tracing`; stdout carries only the build
//! report. `RUST_LOG` wins when set, otherwise this crate logs at `info`, or
//! `debug` with `--debug`.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity.
pub fn default_directive(debug: bool) -> &'static str {
    if debug { "news_card=debug" } else { "news_card=info" }
}

/// Install the global subscriber. Call once, before any work starts.
pub fn init_logging(debug: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
