/*!
Logging setup for gzsync.

Progress lines go to stdout and failures to stderr, as plain text: no
timestamps, targets or level tags. `RUST_LOG` overrides the default filter.
*/

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use crate::{Result, SyncError};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global tracing subscriber
///
/// # Arguments
/// * `verbose` - Log debug-level decisions (skipped entries, byte counts)
///
/// # Errors
/// Fails if a global subscriber has already been set.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .with_level(false)
        .without_time()
        .try_init()
        .map_err(|e| SyncError::validation(format!("Failed to set global tracing subscriber: {e}")))
}
