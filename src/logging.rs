//! Tracing bootstrap shared by the server, the CLI and the scripts.
//!
//! Filtering comes from `RUST_LOG` (default `estate_crm=info`). Output goes
//! to stderr so stdout stays clean for script and CLI output; when a log
//! directory is configured a daily rolling file is written as well.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};

const DEFAULT_FILTER: &str = "estate_crm=info,create_test_user=info,list_users=info";
const LOG_FILE_NAME: &str = "estate_crm.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber.
///
/// Returns the file writer guard when file logging is enabled; keep it alive
/// for the life of the process or buffered lines are lost. Calling this more
/// than once is harmless: later calls leave the first subscriber in place.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());

    match &config.dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let writer = std::io::stderr.and(non_blocking);
            let result = match config.format {
                LogFormat::Json => builder.json().with_writer(writer).try_init(),
                LogFormat::Pretty => builder.with_ansi(false).with_writer(writer).try_init(),
            };
            result.ok().map(|_| guard)
        }
        None => {
            let _ = match config.format {
                LogFormat::Json => builder.json().with_writer(std::io::stderr).try_init(),
                LogFormat::Pretty => builder.with_writer(std::io::stderr).try_init(),
            };
            None
        }
    }
}
