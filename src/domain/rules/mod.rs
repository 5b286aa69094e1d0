// Naming rules - Clip Name and output file name derivation

use std::collections::{HashMap, HashSet};

use crate::config::{ClipNameSettings, CLIP_NAME_PLACEHOLDER};
use crate::domain::model::ClipRange;
use crate::error::{ClipEditorError, ClipEditorResult};
use crate::utils::path::PathUtils;


/// Builds a Clip Name from a row's own values
///
/// The name is `directory/name` where both parts join sanitized column values
/// with the configured separator. The same values always give the same name.
#[derive(Debug, Clone)]
pub struct ClipNamer {
    settings: ClipNameSettings,
    paths: PathUtils,
}

impl ClipNamer {
    pub fn new(settings: ClipNameSettings) -> Self {
        Self {
            settings,
            paths: PathUtils::new(),
        }
    }

    /// Every column the namer reads
    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.settings
            .directory_fields
            .iter()
            .chain(self.settings.fields.iter())
            .map(String::as_str)
    }

    pub fn name(&self, line: u64, fields: &HashMap<String, String>) -> ClipEditorResult<String> {
        let file_name = self.join(line, fields, &self.settings.fields)?;
        if file_name.is_empty() {
            return Err(ClipEditorError::row_format(
                line,
                format!("columns {:?} produce an empty clip name", self.settings.fields),
            ));
        }

        let directory = self.join(line, fields, &self.settings.directory_fields)?;
        if directory.is_empty() {
            Ok(file_name)
        } else {
            Ok(format!("{}/{}", directory, file_name))
        }
    }

    fn join(
        &self,
        line: u64,
        fields: &HashMap<String, String>,
        columns: &[String],
    ) -> ClipEditorResult<String> {
        let mut parts = Vec::with_capacity(columns.len());
        for column in columns {
            let raw = fields.get(column).ok_or_else(|| {
                ClipEditorError::row_format(line, format!("missing column '{}'", column))
            })?;
            let value = if self.settings.file_fields.contains(column) {
                self.paths.get_stem(raw).unwrap_or_default()
            } else {
                raw.clone()
            };
            let value = self.paths.sanitize_component(&value);
            if !value.is_empty() {
                parts.push(value);
            }
        }
        Ok(parts.join(&self.settings.separator))
    }
}

/// Tracks Clip Names handed out during one run
///
/// A repeated name gets `-2`, `-3`, ... appended, skipping any suffix that
/// an earlier row already produced naturally.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, name: &str) -> String {
        if self.taken.insert(name.to_string()) {
            return name.to_string();
        }
        let mut suffix = 2usize;
        loop {
            let candidate = format!("{}-{}", name, suffix);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Renders `output_pattern` for one clip
///
/// `{clip_name}` is the Clip Name; `{start}` and `{end}` are the range bounds
/// in compact `HHMMSS` form.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    pattern: String,
}

impl OutputNamer {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn render(&self, clip_name: &str, range: &ClipRange) -> String {
        self.pattern
            .replace("{start}", &range.start.compact())
            .replace("{end}", &range.end.compact())
            .replace(CLIP_NAME_PLACEHOLDER, clip_name)
    }
}
