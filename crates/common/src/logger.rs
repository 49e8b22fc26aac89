use std::{fs, path::Path};

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_PREFIX: &str = "webhook";
pub const LOG_FILE_SUFFIX: &str = "log";

/// Console output plus an hourly rotating audit file in `log_dir`
/// (`webhook.YYYY-MM-DD-HH.log`).
///
/// The file writer is non-blocking and lossy: when the writer thread falls
/// behind, lines are dropped instead of stalling the caller. The returned
/// guard flushes pending lines on drop and must be held until shutdown.
pub fn setup_logger(log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("debug")
            .add_directive("hyper=warn".parse()?)
            .add_directive("h2=warn".parse()?)
            .add_directive("reqwest=warn".parse()?),
    };

    fs::create_dir_all(log_dir)?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::HOURLY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                // .with_file(true)
                // .with_line_number(true)
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .compact(),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(guard)
}
