//! Development-time tracing for the navigator.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Diagnostics about the loop itself via `RUST_LOG`,
//!   output to stderr.
//!
//! - **Product output**: the `list` listing and `--log-on-fix` lines go to
//!   stdout and are unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber.
///
/// Reads `RUST_LOG` env var. Defaults to `nexterr=debug` when `verbose` is set,
/// `warn` otherwise. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=nexterr=trace nexterr --mode test
/// ```
pub fn init(verbose: bool) {
    let fallback = if verbose { "nexterr=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
