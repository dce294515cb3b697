//! # triad-logging
//!
//! Two output channels for the triad pipeline:
//!
//! - [`Logger`] renders [`LogEvent`]s (stage started, critique scored,
//!   refinement, task progress) for people watching a run, as styled text,
//!   one-liners or JSON lines, with an optional JSON-lines file copy.
//! - [`init_tracing`] wires up `tracing` diagnostics from the library crates.
//!   These stay quiet unless asked for with `--verbose` or `RUST_LOG`.

mod events;

pub use events::{LogEvent, LogFormat, Logger};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose diagnostics follow the requested level
const TRIAD_TARGETS: [&str; 4] = ["triad_agent", "triad_critic", "triad_core", "triad"];

/// Filter directives: `level` for the triad crates, `warn` for dependencies
fn default_directives(level: &str) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(TRIAD_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

/// Install the `tracing` subscriber on stderr. `RUST_LOG` overrides `level`.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(level: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };
    result.is_ok()
}
