// Tracing setup

use tracing_subscriber::{fmt, EnvFilter};

/// Map `-v` repetitions to a filter directive. `RUST_LOG` takes precedence.
pub const fn directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "streamchat=info",
        2 => "streamchat=debug",
        3 => "debug",
        _ => "trace",
    }
}

/// Logs go to stderr; stdout is reserved for rendered output
pub fn init_tracing(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(verbose)));

    fmt()
        .without_time()
        .with_env_filter(filter)
        .with_target(verbose != 0)
        .with_writer(std::io::stderr)
        .init();
}
