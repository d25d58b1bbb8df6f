//! Logging setup.
//!
//! Structured logging through `tracing`. `RUST_LOG` takes precedence over the
//! configured level; a log directory adds a daily rolling file.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the global logger with the default level and no file output.
pub fn init_default_logger() -> bool {
    init_logger("info", None)
}

/// Initialize the global logger.
///
/// Returns false if a global subscriber was already installed.
pub fn init_logger(log_level: &str, log_dir: Option<&str>) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "vetclinic.log");
            return subscriber
                .with_ansi(false)
                .with_writer(file_appender)
                .try_init()
                .is_ok();
        }
    }

    subscriber.try_init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let _ = init_logger("debug", dir.path().to_str());
        assert!(!init_logger("info", None));
        tracing::info!("logger initialized");
    }
}
