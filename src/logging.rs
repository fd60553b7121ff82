//! Tracing subscriber set-up for the binaries.
//!
//! Filter directives come from `DRAFTSIM_LOG` (standard `EnvFilter` syntax),
//! defaulting to `draftsim=info,warn`. Output goes to stderr so stdout stays
//! machine-readable.

use std::sync::Once;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DRAFTSIM_LOG";
pub const DEFAULT_FILTER: &str = "draftsim=info,warn";

static INIT: Once = Once::new();

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let installed = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true),
            )
            .with(filter)
            .try_init();
        if installed.is_err() {
            tracing::debug!("a global subscriber was already installed");
        }
    });
}
