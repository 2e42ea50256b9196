use crate::application::Config;
use anyhow::{Context, Result};
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use log::info;

const LOG_FILE_BASENAME: &str = "wawata";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

/// Maps `-v` repetitions onto a level, falling back to the configured one.
pub fn effective_level(config: &Config, verbose: u8) -> String {
    match verbose {
        0 => config.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Starts the process-wide logger. Keep the handle alive until exit so
/// buffered file output gets flushed.
pub fn init_logging(config: &Config, verbose: u8) -> Result<LoggerHandle> {
    let level = effective_level(config, verbose);
    let mut logger = Logger::try_with_str(&level)
        .with_context(|| format!("Invalid log level `{level}`"))?
        .format(flexi_logger::default_format);

    if config.log_to_file {
        let log_dir = config.log_dir();
        std::fs::create_dir_all(&log_dir).with_context(|| {
            format!("Failed to create log directory {}", log_dir.display())
        })?;

        logger = logger
            .log_to_file(
                FileSpec::default()
                    .directory(log_dir)
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .append()
            .duplicate_to_stderr(Duplicate::Warn)
            .format_for_files(flexi_logger::detailed_format);
    }

    let handle = logger.start().context("Failed to start logger")?;
    info!(
        "wawata {} starting, level={level}, dir={}",
        env!("CARGO_PKG_VERSION"),
        config.journal_dir.display()
    );
    Ok(handle)
}
