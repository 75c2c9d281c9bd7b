//! Diagnostic logging to stderr

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Env var holding a full `EnvFilter` directive, e.g. `kubenest=trace`
pub const LOG_ENV: &str = "KUBENEST_LOG";

/// Pick the filter directive: `KUBENEST_LOG`, then `-v`/`-vv`, then the
/// legacy `DEBUG=1` switch, else warnings only.
pub fn filter_directive(env_filter: Option<&str>, verbosity: u8, legacy_debug: Option<&str>) -> String {
    if let Some(directive) = env_filter.filter(|d| !d.trim().is_empty()) {
        return directive.to_string();
    }
    match verbosity {
        0 if legacy_debug == Some("1") => "debug".to_string(),
        0 => "warn".to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

pub fn init(verbosity: u8) -> Result<()> {
    let env_filter = std::env::var(LOG_ENV).ok();
    let legacy_debug = std::env::var("DEBUG").ok();
    let directive = filter_directive(env_filter.as_deref(), verbosity, legacy_debug.as_deref());

    tracing_subscriber::registry()
        .with(EnvFilter::new(directive))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}
