//! Logging initialization for the codeatlas CLI: logs go to STDOUT,
//! filtered by `RUST_LOG` unless verbose output is requested.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}
