//! Logging setup.
//!
//! Code logs through the `log` macros; `init` installs a `tracing-subscriber`
//! formatter that also collects `log` records.

use anyhow::{Context, Result};
use log::debug;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Filter from `RUST_LOG` when it is set, otherwise from the config
fn build_filter(configured: &str, env_override: Option<String>) -> Result<EnvFilter> {
    let directives = env_override
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| configured.to_string());
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter '{}'", directives))
}

/// Install the global subscriber. Calling it again is harmless.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(&config.filter, std::env::var(EnvFilter::DEFAULT_ENV).ok())?;

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
    {
        debug!("Logging already initialized: {}", e);
    }
    Ok(())
}
