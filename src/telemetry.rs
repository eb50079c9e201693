//! Log subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset and no `-v` was given.
pub const DEFAULT_FILTER: &str = "warn,multimart_content=info";

/// Fallback filter for a `-v` count: one raises this crate to debug, two to trace.
pub fn filter_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => DEFAULT_FILTER,
        1 => "warn,multimart_content=debug",
        _ => "info,multimart_content=trace",
    }
}

/// Install the global fmt subscriber on stderr, so stdout stays clean for
/// JSON output. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}
