use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "shuxue.log";

/// Held by `main` so buffered file lines are flushed on shutdown
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    /// Daily rolling files go here when set
    pub file_dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_env(filter: &str) -> Self {
        Self::from_lookup(filter, |key| std::env::var(key).ok())
    }

    fn from_lookup(filter: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let file_enabled = lookup("ENABLE_FILE_LOGS")
            .map(|v| matches!(v.trim(), "true" | "1"))
            .unwrap_or(false);
        let file_dir = file_enabled.then(|| {
            lookup("LOG_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./logs"))
        });

        Self {
            filter: filter.to_string(),
            file_dir,
        }
    }
}

fn file_writer(dir: &Path) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("log directory {} unavailable, file logging off: {err}", dir.display());
        return None;
    }
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    Some(tracing_appender::non_blocking(appender))
}

pub fn init_tracing(settings: &LogSettings) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    let file = settings.file_dir.as_deref().and_then(file_writer);
    let (file_layer, guard) = match file {
        Some((writer, guard)) => (
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true),
            ),
            Some(FileLogGuard { _guard: guard }),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_is_opt_in() {
        let settings = LogSettings::from_lookup("debug", |_| None);
        assert_eq!(settings.file_dir, None);
        assert_eq!(settings.filter, "debug");

        let settings = LogSettings::from_lookup("info", |key| match key {
            "ENABLE_FILE_LOGS" => Some("1".to_string()),
            _ => None,
        });
        assert_eq!(settings.file_dir, Some(PathBuf::from("./logs")));

        let settings = LogSettings::from_lookup("info", |key| match key {
            "ENABLE_FILE_LOGS" => Some("true".to_string()),
            "LOG_DIR" => Some("/var/log/shuxue".to_string()),
            _ => None,
        });
        assert_eq!(settings.file_dir, Some(PathBuf::from("/var/log/shuxue")));
    }
}
