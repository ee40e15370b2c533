//! Tracing setup shared by the binaries.
//!
//! Logs go to stderr so stdout stays reserved for feature lists and reports.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies (e.g. `info`,
/// or `flagcheck=debug,warn`).
pub fn init_logging(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_an_error_instead_of_panicking() {
        let _ = init_logging("debug");
        assert!(init_logging("info").is_err());
    }
}
