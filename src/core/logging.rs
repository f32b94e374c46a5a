//! Structured logging
//!
//! JSON or text output through `tracing-subscriber`, written to stdout or to a
//! size-rotated log file through a non-blocking `tracing-appender` worker.

use crate::core::config::LoggingConfig;
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Keeps the background log writer alive; drop it only at shutdown
pub struct Logger {
    _guard: WorkerGuard,
}

impl Logger {
    /// Install the global subscriber described by `config`
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let level = parse_log_level(&config.level)?;

        // RUST_LOG wins over the configured level
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

        let (writer, guard) = match config.output.as_str() {
            "stdout" => tracing_appender::non_blocking(io::stdout()),
            "file" => {
                let log_file = config
                    .log_file
                    .as_ref()
                    .context("log_file must be specified when output is 'file'")?;
                let appender =
                    RollingFileAppender::for_path(log_file, config.max_file_size, config.max_backups)?;
                tracing_appender::non_blocking(appender)
            }
            other => anyhow::bail!("Invalid output configuration: {}", other),
        };

        let fmt_layer = match config.format.as_str() {
            "json" => fmt::layer()
                .json()
                .with_writer(writer)
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_target(true)
                .boxed(),
            "text" => fmt::layer()
                .with_writer(writer)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .boxed(),
            other => anyhow::bail!("Invalid format configuration: {}", other),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize tracing subscriber")?;

        tracing::info!(
            level = %config.level,
            format = %config.format,
            output = %config.output,
            "Logging system initialized"
        );

        Ok(Logger { _guard: guard })
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {}", level),
    }
}

/// File writer that rotates `app.log` into `app.log.1 .. app.log.N` once it
/// would grow past `max_file_size`.
pub struct RollingFileAppender {
    path: PathBuf,
    max_file_size: usize,
    max_backups: usize,
    file: Option<File>,
    written: usize,
}

impl RollingFileAppender {
    /// Create the appender, making sure the log directory exists
    pub fn for_path(path: &Path, max_file_size: usize, max_backups: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
        }
        path.file_name().context("Log file must have a filename")?;

        Ok(Self {
            path: path.to_path_buf(),
            max_file_size,
            max_backups,
            file: None,
            written: 0,
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        for i in (1..self.max_backups).rev() {
            let from = self.backup_path(i);
            if from.exists() {
                fs::rename(&from, self.backup_path(i + 1))?;
            }
        }

        if self.path.exists() {
            fs::rename(&self.path, self.backup_path(1))?;
        }

        self.written = 0;
        Ok(())
    }

    fn open(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.written = file.metadata()?.len() as usize;
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))
    }
}

impl Write for RollingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.open()?;
        if self.written > 0 && self.written + buf.len() > self.max_file_size {
            self.rotate()?;
        }

        let written = self.open()?.write(buf)?;
        self.written += written;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("debug"), Ok(Level::DEBUG)));
        assert!(matches!(parse_log_level("INFO"), Ok(Level::INFO)));
        assert!(matches!(parse_log_level("warn"), Ok(Level::WARN)));
        assert!(matches!(parse_log_level("error"), Ok(Level::ERROR)));
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_backup_paths() {
        let dir = tempfile::tempdir().unwrap();
        let appender = RollingFileAppender::for_path(&dir.path().join("api.log"), 1024, 3).unwrap();

        assert_eq!(appender.backup_path(1), dir.path().join("api.log.1"));
        assert_eq!(appender.backup_path(2), dir.path().join("api.log.2"));
    }

    #[test]
    fn test_rotation_keeps_bounded_backups() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("logs").join("api.log");
        let mut appender = RollingFileAppender::for_path(&log_path, 16, 2).unwrap();

        for _ in 0..5 {
            appender.write_all(b"0123456789abcdef").unwrap();
        }
        appender.flush().unwrap();

        assert!(log_path.exists());
        assert!(dir.path().join("logs").join("api.log.1").exists());
        assert!(dir.path().join("logs").join("api.log.2").exists());
        assert!(!dir.path().join("logs").join("api.log.3").exists());
        assert_eq!(fs::read(&log_path).unwrap().len(), 16);
    }
}
