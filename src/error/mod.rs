//! Error handling module for ClipEditor

use thiserror::Error;

/// Main error type for ClipEditor operations
#[derive(Error, Debug)]
pub enum ClipEditorError {
    /// Settings file missing, unreadable, or incomplete
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Source video missing or not openable
    #[error("Source video not found: {path} ({message})")]
    SourceNotFound { path: String, message: String },

    /// Clip table missing
    #[error("Clip table not found: {path}")]
    NotFound { path: String },

    /// A clip table row is missing required data
    ///
    /// `start` and `end` hold the row's raw time values when it had them.
    #[error("Malformed row at line {line}: {message}")]
    RowFormat {
        line: u64,
        message: String,
        start: Option<String>,
        end: Option<String>,
    },

    /// Time string is not `minutes:seconds`
    #[error("Invalid time format: {time}. Expected minutes:seconds")]
    Format { time: String },

    /// Requested range is empty or outside the source
    #[error("Invalid clip range {start}-{end}: {message}")]
    Range {
        start: String,
        end: String,
        message: String,
    },

    /// Output could not be created or finalized
    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    /// Demux/decode/encode failure inside the media engine
    #[error("Media engine error: {message}")]
    Media { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClipEditorError {
    /// Errors that stop the run before any row is processed
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClipEditorError::Config { .. }
                | ClipEditorError::SourceNotFound { .. }
                | ClipEditorError::NotFound { .. }
        )
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        ClipEditorError::Config {
            message: message.into(),
        }
    }

    pub(crate) fn row_format(line: u64, message: impl Into<String>) -> Self {
        ClipEditorError::RowFormat {
            line,
            message: message.into(),
            start: None,
            end: None,
        }
    }

    /// Attach a row's raw time values to a `RowFormat` error
    pub(crate) fn with_raw_times(self, raw_start: Option<&str>, raw_end: Option<&str>) -> Self {
        match self {
            ClipEditorError::RowFormat { line, message, .. } => ClipEditorError::RowFormat {
                line,
                message,
                start: raw_start.map(String::from),
                end: raw_end.map(String::from),
            },
            other => other,
        }
    }

    pub(crate) fn media(message: impl std::fmt::Display) -> Self {
        ClipEditorError::Media {
            message: message.to_string(),
        }
    }
}

/// Result type alias for ClipEditor operations
pub type ClipEditorResult<T> = std::result::Result<T, ClipEditorError>;
