//! Diagnostic logging.
//!
//! User-facing progress goes to stdout through `colored` lines; `tracing`
//! events go to stderr so the two never interleave in pipes. `RUST_LOG`
//! wins over `--log-level`, which wins over the default.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "sightsprite=warn";

/// Filter directive for a `--log-level` value such as `debug`.
pub fn directive_for(level: Option<&str>) -> String {
    match level.map(str::trim).filter(|l| !l.is_empty()) {
        Some(level) => format!("sightsprite={}", level.to_ascii_lowercase()),
        None => DEFAULT_DIRECTIVE.to_string(),
    }
}

pub fn init_logging(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(env) if !env.trim().is_empty() => EnvFilter::try_new(env)?,
        _ => EnvFilter::try_new(directive_for(level))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    tracing::debug!(version = crate::config::SIGHTSPRITE_VERSION, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_defaults_to_warn() {
        assert_eq!(directive_for(None), "sightsprite=warn");
        assert_eq!(directive_for(Some("  ")), "sightsprite=warn");
    }

    #[test]
    fn test_directive_uses_requested_level() {
        assert_eq!(directive_for(Some("DEBUG")), "sightsprite=debug");
        assert!(EnvFilter::try_new(directive_for(Some("trace"))).is_ok());
    }
}
