use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV: &str = "SEARCHABLE_MAPPER_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

pub fn build_filter(directive: Option<&str>) -> Result<EnvFilter> {
    if let Some(directive) = directive {
        return EnvFilter::try_new(directive)
            .map_err(|e| anyhow::anyhow!("Invalid log filter '{directive}': {e}"));
    }
    Ok(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
}

/// Logs to stderr; stdout carries the mapping output.
pub fn init_logging(directive: Option<&str>) -> Result<()> {
    let filter = build_filter(directive)?;
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}
