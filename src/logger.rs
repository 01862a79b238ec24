//! Logger setup
//!
//! The terminal belongs to ncurses while the tree is shown, so interactive
//! runs log to a file. `--once` runs log to stderr.

use std::env;
use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TerminalMode};

pub const LOG_LEVEL_ENV: &str = "PROCTREE_LOG";
pub const LOG_FILE_ENV: &str = "PROCTREE_LOG_FILE";

fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

fn log_level() -> LevelFilter {
    parse_level(env::var(LOG_LEVEL_ENV).ok().as_deref())
}

/// Install the global logger
///
/// Without a log file and outside `--once`, nothing is installed and the log
/// macros are no-ops.
pub fn init(log_file: Option<&Path>, once: bool) -> Result<()> {
    let level = log_level();
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Debug)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        loggers.push(simplelog::WriteLogger::new(level, config.clone(), file));
    }
    if once {
        loggers.push(simplelog::TermLogger::new(
            level,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }

    if loggers.is_empty() {
        return Ok(());
    }
    CombinedLogger::init(loggers).context("Failed to init logger")
}
