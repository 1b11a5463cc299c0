// src/telemetry.rs
// =============================================================================
// Logging setup.
//
// Diagnostics (skipped targets, rejected links) go through `tracing` to
// stderr, so stdout only carries the processing/extracted lines. RUST_LOG
// overrides the default level.
// =============================================================================

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "linkscope=debug"
    } else {
        "linkscope=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
