//! Run settings loaded from a YAML or TOML file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ClipEditorError, ClipEditorResult};
use crate::utils::logging::LoggingConfig;

/// Placeholder for the clip name in `output_pattern`
pub const CLIP_NAME_PLACEHOLDER: &str = "{clip_name}";

/// Everything one batch run needs; immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Source video every clip is cut from
    pub source_video: PathBuf,
    /// CSV table listing the clips
    pub clip_file: PathBuf,
    /// Root directory for generated clips
    pub output_dir: PathBuf,
    /// Output file name pattern, e.g. `{clip_name}_{start}-{end}.mp4`
    pub output_pattern: String,
    /// Log file; `.log` is appended when it has no extension
    pub log_file: PathBuf,
    #[serde(default)]
    pub columns: ColumnSettings,
    #[serde(default)]
    pub clip_name: ClipNameSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub overwrite: OverwritePolicy,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Column names holding the clip range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnSettings {
    pub start: String,
    pub end: String,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self {
            start: "From".to_string(),
            end: "To".to_string(),
        }
    }
}

/// How a Clip Name is assembled from row values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClipNameSettings {
    /// Columns joined into the clip's file name
    pub fields: Vec<String>,
    /// Columns joined into a sub-directory; empty for a flat layout
    pub directory_fields: Vec<String>,
    /// Columns holding paths, reduced to their file stem
    pub file_fields: Vec<String>,
    pub separator: String,
}

impl Default for ClipNameSettings {
    fn default() -> Self {
        Self {
            fields: vec!["File".to_string(), "Name".to_string(), "Play".to_string()],
            directory_fields: vec!["File".to_string(), "Name".to_string()],
            file_fields: vec!["File".to_string()],
            separator: "-".to_string(),
        }
    }
}

/// Export strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Remux packets; cuts land on the preceding keyframe
    Copy,
    /// Decode and re-encode video; cuts land on the requested frame
    Reencode,
}

/// Encoder parameters passed straight to the media engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSettings {
    pub mode: ExportMode,
    /// Encoder name, e.g. `libx264`
    pub vcodec: String,
    /// Encoder preset, e.g. `medium`
    pub compression: String,
    /// Constant Rate Factor (0-51)
    pub crf: u8,
    pub threads: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            mode: ExportMode::Reencode,
            vcodec: "libx264".to_string(),
            compression: "medium".to_string(),
            crf: 23,
            threads: num_cpus::get(),
        }
    }
}

/// What to do when a clip's output file already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Leave the existing file alone and skip the row
    #[default]
    Never,
    /// Replace the existing file
    Always,
}

impl Settings {
    /// Load settings from `path`; `.toml` files are read as TOML, anything else as YAML
    pub fn load(path: &Path) -> ClipEditorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClipEditorError::config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let parsed = if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        };
        let settings = parsed.map_err(|e| match e {
            ClipEditorError::Config { message } => {
                ClipEditorError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;

        Ok(settings)
    }

    pub fn from_yaml_str(content: &str) -> ClipEditorResult<Self> {
        let settings: Settings =
            serde_yaml::from_str(content).map_err(|e| ClipEditorError::config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> ClipEditorResult<Self> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| ClipEditorError::config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Shape checks that serde cannot express
    pub fn validate(&self) -> ClipEditorResult<()> {
        let required = [
            ("source_video", self.source_video.as_os_str().is_empty()),
            ("clip_file", self.clip_file.as_os_str().is_empty()),
            ("output_dir", self.output_dir.as_os_str().is_empty()),
            ("output_pattern", self.output_pattern.trim().is_empty()),
            ("log_file", self.log_file.as_os_str().is_empty()),
        ];
        if let Some((key, _)) = required.iter().find(|(_, empty)| *empty) {
            return Err(ClipEditorError::config(format!("'{}' must not be empty", key)));
        }

        if !self.output_pattern.contains(CLIP_NAME_PLACEHOLDER) {
            return Err(ClipEditorError::config(format!(
                "output_pattern must contain {}",
                CLIP_NAME_PLACEHOLDER
            )));
        }
        if self.columns.start.trim().is_empty() || self.columns.end.trim().is_empty() {
            return Err(ClipEditorError::config("column names must not be empty"));
        }
        if self.clip_name.fields.is_empty() {
            return Err(ClipEditorError::config("clip_name.fields must name at least one column"));
        }
        if self.export.crf > 51 {
            return Err(ClipEditorError::config("export.crf cannot exceed 51"));
        }
        if self.export.threads == 0 {
            return Err(ClipEditorError::config("export.threads must be at least 1"));
        }
        if self.export.vcodec.trim().is_empty() {
            return Err(ClipEditorError::config("export.vcodec must not be empty"));
        }
        Ok(())
    }
}
