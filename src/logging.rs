//! Logging setup with `tracing-subscriber`.
//!
//! - `warn`: dropped or unparseable answers, empty charts
//! - `info`: analysis results and written files
//! - `debug`: subset sizes and intermediate tables

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level for this crate's events given the number of `-v` flags.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn default_directive(level: Level) -> String {
    format!("warn,survey_insights={}", level.as_str().to_lowercase())
}

/// Install the global subscriber. `RUST_LOG` overrides the verbosity flags.
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(level_from_verbosity(verbosity))))
        .map_err(|e| anyhow::anyhow!("invalid log filter: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}
