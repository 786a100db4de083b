//! Diagnostics output.
//!
//! Structured logs go to stderr, next to the fixed-format progress lines;
//! stdout carries only the final report.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `verbosity`.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "allping=info",
        1 => "allping=debug",
        _ => "allping=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .init();
}
