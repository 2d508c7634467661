//! Diagnostic logging.
//!
//! Human-facing output goes through [`crate::ui`]; this is the structured
//! trace of what the engine decided and invoked, written to stderr.

use crate::project_identity;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "debug";

/// `PKGSYNC_LOG`, then `RUST_LOG`, then the verbosity default.
fn filter(verbose: bool) -> EnvFilter {
    let directive = project_identity::env_get("LOG")
        .or_else(|| std::env::var("RUST_LOG").ok().filter(|v| !v.trim().is_empty()));

    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    directive
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter(verbose))
        .with(fmt_layer)
        .try_init();
}
