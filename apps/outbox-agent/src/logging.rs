//! Console and rolling-file logging.
//!
//! Every record goes to stderr and to `outbox-agent.log` under `log.dir`.
//! The file rolls over at midnight or once it reaches `log.max_file_size`
//! bytes, whichever comes first; rolled files are numbered `.1`, `.2`, ...
//! and only the newest `log.max_files` are kept, which bounds the log
//! directory by both size and age.

use std::path::Path;

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::config::LogSection;

const LOG_FILE_NAME: &str = "outbox-agent.log";

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the program.
pub fn init(config: &LogSection) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.dir)?;

    let appender = file_appender(&config.dir, config)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(guard)
}

fn file_appender(dir: &Path, config: &LogSection) -> std::io::Result<BasicRollingFileAppender> {
    let condition = RollingConditionBasic::new()
        .daily()
        .max_size(config.max_file_size.max(1));
    BasicRollingFileAppender::new(dir.join(LOG_FILE_NAME), condition, config.max_files.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn section(dir: &Path, max_file_size: u64, max_files: usize) -> LogSection {
        LogSection {
            dir: dir.to_path_buf(),
            max_file_size,
            max_files,
            ..LogSection::default()
        }
    }

    #[test]
    fn rolls_over_on_size() {
        let dir = tempfile::tempdir().unwrap();
        let config = section(dir.path(), 64, 5);
        let mut appender = file_appender(dir.path(), &config).unwrap();

        for _ in 0..4 {
            appender.write_all(&[b'x'; 50]).unwrap();
            appender.flush().unwrap();
        }
        drop(appender);

        assert!(dir.path().join(LOG_FILE_NAME).exists());
        assert!(dir.path().join(format!("{LOG_FILE_NAME}.1")).exists());
    }

    #[test]
    fn keeps_at_most_max_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = section(dir.path(), 16, 2);
        let mut appender = file_appender(dir.path(), &config).unwrap();

        for _ in 0..10 {
            appender.write_all(&[b'y'; 20]).unwrap();
            appender.flush().unwrap();
        }
        drop(appender);

        assert!(dir.path().join(format!("{LOG_FILE_NAME}.2")).exists());
        assert!(!dir.path().join(format!("{LOG_FILE_NAME}.3")).exists());
    }
}
