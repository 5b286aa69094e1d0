//! Time parsing and formatting utilities

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{ClipEditorError, ClipEditorResult};

/// Normalized `hours:minutes:seconds` time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hms {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Hms {
    /// Build from a total second count, rolling seconds and minutes over
    pub fn from_total_seconds(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }

    /// `HHMMSS`, used in output file names
    pub fn compact(&self) -> String {
        format!("{:02}{:02}{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl FromStr for Hms {
    type Err = ClipEditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeParser::new().parse(s)
    }
}

/// Converts `minutes:seconds` strings into [`Hms`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeParser;

impl TimeParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `minutes:seconds`; minutes may exceed 59 and roll into hours
    pub fn parse(&self, time_str: &str) -> ClipEditorResult<Hms> {
        let trimmed = time_str.trim();
        let invalid = || ClipEditorError::Format {
            time: time_str.to_string(),
        };

        let (minutes, seconds) = trimmed.split_once(':').ok_or_else(invalid)?;
        if seconds.contains(':') {
            return Err(invalid());
        }

        let minutes = parse_component(minutes).ok_or_else(invalid)?;
        let seconds = parse_component(seconds).ok_or_else(invalid)?;
        let total = minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .ok_or_else(invalid)?;

        let hms = Hms::from_total_seconds(total);
        debug!("Time conversion for {} -> {}", trimmed, hms);
        Ok(hms)
    }

    /// Parse and render in canonical `H:MM:SS` form
    pub fn to_hms(&self, time_str: &str) -> ClipEditorResult<String> {
        self.parse(time_str).map(|hms| hms.to_string())
    }
}

// Digits only: rejects signs, blanks and fractions that `u64::from_str` would
// otherwise partially accept (`+5`).
fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}
