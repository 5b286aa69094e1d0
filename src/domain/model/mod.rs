// Domain models - clip rows and clip ranges

use std::collections::HashMap;
use std::fmt;

use crate::error::{ClipEditorError, ClipEditorResult};
use crate::utils::time::{Hms, TimeParser};


/// One row of the clip table plus its derived Clip Name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRow {
    /// 1-based line number in the source table
    pub line: u64,
    pub fields: HashMap<String, String>,
    pub clip_name: String,
}

impl ClipRow {
    /// Raw value of a column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Trimmed value of a column that must be present
    pub fn require(&self, column: &str) -> ClipEditorResult<&str> {
        self.get(column)
            .map(str::trim)
            .ok_or_else(|| {
                ClipEditorError::row_format(self.line, format!("missing column '{}'", column))
            })
    }
}

/// Half-open `[start, end)` range within the source video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRange {
    pub start: Hms,
    pub end: Hms,
}

impl ClipRange {
    /// Convert both `minutes:seconds` bounds and check ordering
    pub fn parse(start: &str, end: &str) -> ClipEditorResult<Self> {
        let parser = TimeParser::new();
        let start = parser.parse(start)?;
        let end = parser.parse(end)?;
        Self::new(start, end)
    }

    pub fn new(start: Hms, end: Hms) -> ClipEditorResult<Self> {
        let range = Self { start, end };
        if end <= start {
            return Err(range.error("end must be after start"));
        }
        Ok(range)
    }

    pub fn start_seconds(&self) -> f64 {
        self.start.total_seconds() as f64
    }

    pub fn end_seconds(&self) -> f64 {
        self.end.total_seconds() as f64
    }

    pub fn duration_seconds(&self) -> u64 {
        self.end.total_seconds() - self.start.total_seconds()
    }

    /// Check the range fits inside a source of known length
    pub fn validate_against_duration(&self, duration: Option<f64>) -> ClipEditorResult<()> {
        let Some(duration) = duration else {
            return Ok(());
        };
        if self.start_seconds() >= duration {
            return Err(self.error(&format!("starts after the source ends ({:.2}s)", duration)));
        }
        if self.end_seconds() > duration {
            return Err(self.error(&format!("exceeds source duration ({:.2}s)", duration)));
        }
        Ok(())
    }

    fn error(&self, message: &str) -> ClipEditorError {
        ClipEditorError::Range {
            start: self.start.to_string(),
            end: self.end.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ClipRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
