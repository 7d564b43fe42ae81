//! Log dispatch setup for the library's `log` macros.

use anyhow::{Context, Result};

use crate::config::LoggingConfig;

/// Install the global fern dispatcher according to the logging config.
/// A no-op when logging is disabled.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let level: log::LevelFilter = config
        .level
        .parse()
        .with_context(|| format!("invalid log level '{}'", config.level))?;

    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ));
        })
        .level(level);

    let dispatch = match &config.file {
        Some(path) => dispatch.chain(fern::log_file(path).with_context(|| format!("cannot open log file {}", path.display()))?),
        None => dispatch.chain(std::io::stderr()),
    };

    dispatch.apply().context("logger already initialized")?;
    Ok(())
}
