use std::str::FromStr;

use tracing::Level;

use crate::core::errors::{CertStoreError, Result};

/// Level implied by the command-line switches, falling back to the
/// configured level.
pub fn level_for(verbose: bool, quiet: bool, configured: &str) -> Result<Level> {
    if quiet {
        return Ok(Level::ERROR);
    }
    if verbose {
        return Ok(Level::DEBUG);
    }
    Level::from_str(configured.trim()).map_err(|_| CertStoreError::InvalidConfig {
        detail: format!(
            "Invalid [logging] level '{configured}'. Expected trace, debug, info, warn or error"
        ),
    })
}

/// Install the stderr subscriber. Stdout is reserved for command output.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
