//! Logger setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the filter enables `default_level` for
/// the calling crate (derived from `bin_name`) and for `tower_http`.
///
/// Calling this more than once is harmless: later calls are ignored.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(bin_name, default_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

fn default_directive(bin_name: &str, default_level: &str) -> String {
    let crate_name = bin_name.replace('-', "_");
    format!("{crate_name}={default_level},tower_http={default_level}")
}
