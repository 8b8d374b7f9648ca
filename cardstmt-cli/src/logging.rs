use tracing_subscriber::EnvFilter;

/// Default filter for the verbosity flags. `-q` wins over `-v`.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// Log to stderr. `RUST_LOG` overrides the flags.
pub fn init_tracing(verbose: u8, quiet: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(verbose, quiet).into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
