use appraise_error::FatalError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Keeps the file writer flushing; drop it only at shutdown.
pub struct LoggingGuard {
    pub file: Option<WorkerGuard>,
}

/// Console logging plus, when `config.dir` is set, a daily rolling file.
pub fn init_tracing(config: &LoggingConfig) -> Result<LoggingGuard, FatalError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let (file_writer, file_guard) = match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| FatalError::FileOperation {
                operation: "create log directory",
                path: dir.clone(),
                message: e.to_string(),
            })?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
    });

    // exactly one of these is Some
    let (console_json, console_text) = if config.json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (
            None,
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            ),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_json)
        .with(console_text)
        .try_init()
        .map_err(|e| FatalError::Config(format!("tracing already initialized: {e}")))?;

    Ok(LoggingGuard { file: file_guard })
}
