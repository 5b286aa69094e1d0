//! Logging configuration: console plus size-rotated log file
//!
//! [`LoggingSystem::initialize`] installs the global `tracing` subscriber. It is
//! meant to run once per process, after settings are loaded; there is no
//! teardown; the file sink is flushed on every write.

use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::error::{ClipEditorError, ClipEditorResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Logging configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level, overridden by `RUST_LOG` when set
    pub level: LogLevel,
    /// Log file record format
    pub format: LogFormat,
    /// Rotate once the file would grow past this size; 0 disables rotation
    pub max_bytes: u64,
    /// Rotated files kept next to the active one
    pub backup_count: usize,
}

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Log file record format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// One JSON object per record
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            max_bytes: 10 * 1024 * 1024,
            backup_count: 5,
        }
    }
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ClipEditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(ClipEditorError::config(format!("unknown log level '{}'", other))),
        }
    }
}

/// Resolve the configured log file name; a bare name gets a `.log` extension
pub fn log_file_path(log_file: &Path) -> PathBuf {
    if log_file.extension().is_some() {
        log_file.to_path_buf()
    } else {
        log_file.with_extension("log")
    }
}

/// Logging system manager
pub struct LoggingSystem {
    config: LoggingConfig,
    file_path: PathBuf,
}

impl LoggingSystem {
    pub fn new(config: LoggingConfig, log_file: &Path) -> Self {
        Self {
            config,
            file_path: log_file_path(log_file),
        }
    }

    /// Install console and rotating-file sinks as the global subscriber
    pub fn initialize(&self) -> ClipEditorResult<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.level.as_filter()));

        let writer = RotatingFileWriter::open(
            &self.file_path,
            self.config.max_bytes,
            self.config.backup_count,
        )?;
        let writer = Mutex::new(writer);
        let timer = ChronoLocal::new(TIMESTAMP_FORMAT.to_string());

        let console_layer = fmt::layer()
            .with_timer(timer.clone())
            .with_ansi(io::stdout().is_terminal())
            .with_writer(io::stdout);

        let file_layer = match self.config.format {
            LogFormat::Text => fmt::layer()
                .with_timer(timer)
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_timer(timer)
                .with_writer(writer)
                .boxed(),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| ClipEditorError::config(format!("logging already initialized: {}", e)))?;

        self.log_system_info();
        Ok(())
    }

    /// Startup notice
    pub fn log_system_info(&self) {
        tracing::info!("=== ClipEditor {} ===", env!("CARGO_PKG_VERSION"));
        tracing::info!("Log file: {}", self.file_path.display());
        tracing::debug!("Logging level: {:?}", self.config.level);
    }

    /// Console-only logging for failures that happen before settings exist
    pub fn initialize_console_fallback() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .try_init();
    }
}

/// Append-mode log file that rolls over by size
///
/// When the next write would take the active file past `max_bytes`, the file
/// is renamed to `<name>.1`, older backups shift up by one, and anything past
/// `backup_count` is removed. With `backup_count == 0` the file is truncated
/// instead.
#[derive(Debug)]
pub struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: File,
    written: u64,
}

impl RotatingFileWriter {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = Self::open_append(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backup_count,
            file,
            written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `index`-th rotated file (`name.log.1`, `name.log.2`, ...)
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn open_append(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.max_bytes > 0 && self.written > 0 && self.written + incoming as u64 > self.max_bytes
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backup_count == 0 {
            self.file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&self.path)?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.backup_path(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backup_count).rev() {
            let src = self.backup_path(index);
            if src.exists() {
                fs::rename(&src, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;

        self.file = Self::open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path_gets_extension() {
        assert_eq!(log_file_path(Path::new("ClipEditor")), PathBuf::from("ClipEditor.log"));
        assert_eq!(log_file_path(Path::new("logs/run.txt")), PathBuf::from("logs/run.txt"));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_writer_rotates_and_bounds_backups() {
        let temp = tempfile::tempdir().unwrap();
        let mut writer = RotatingFileWriter::open(temp.path().join("run.log"), 10, 2).unwrap();

        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            writer.write_all(line.as_bytes()).unwrap();
        }
        writer.flush().unwrap();

        let active = fs::read_to_string(writer.path()).unwrap();
        let first = fs::read_to_string(writer.backup_path(1)).unwrap();
        let second = fs::read_to_string(writer.backup_path(2)).unwrap();
        assert_eq!(active, "dddddddd\n");
        assert_eq!(first, "cccccccc\n");
        assert_eq!(second, "bbbbbbbb\n");
        assert!(!writer.backup_path(3).exists());
    }

    #[test]
    fn test_writer_without_limit_never_rotates() {
        let temp = tempfile::tempdir().unwrap();
        let mut writer = RotatingFileWriter::open(temp.path().join("run.log"), 0, 3).unwrap();
        for _ in 0..100 {
            writer.write_all(b"0123456789\n").unwrap();
        }
        assert!(!writer.backup_path(1).exists());
        assert_eq!(fs::metadata(writer.path()).unwrap().len(), 1100);
    }

    #[test]
    fn test_writer_without_backups_truncates() {
        let temp = tempfile::tempdir().unwrap();
        let mut writer = RotatingFileWriter::open(temp.path().join("run.log"), 10, 0).unwrap();
        writer.write_all(b"first....\n").unwrap();
        writer.write_all(b"second...\n").unwrap();
        assert_eq!(fs::read_to_string(writer.path()).unwrap(), "second...\n");
        assert!(!writer.backup_path(1).exists());
    }

    #[test]
    fn test_writer_resumes_existing_size() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("run.log");
        fs::write(&path, b"previous run\n").unwrap();

        let mut writer = RotatingFileWriter::open(&path, 16, 1).unwrap();
        writer.write_all(b"next run\n").unwrap();

        assert_eq!(fs::read_to_string(writer.backup_path(1)).unwrap(), "previous run\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "next run\n");
    }
}
