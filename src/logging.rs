use std::str::FromStr;

use color_eyre::eyre::{Result, eyre};
use tracing::Level;

/// Parse a level name (`error`, `warn`, `info`, `debug`, `trace`).
pub fn parse_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim()).map_err(|_| eyre!("unknown log level `{level}`"))
}

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// reports.
pub fn init_tracing(level: Level, json: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if json {
        tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}
