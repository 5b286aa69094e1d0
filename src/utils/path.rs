//! Path utilities for clip names and output locations

use std::path::{Path, PathBuf};

use crate::error::{ClipEditorError, ClipEditorResult};

/// Path helpers used when turning row values into file names
#[derive(Debug, Default, Clone, Copy)]
pub struct PathUtils;

impl PathUtils {
    pub fn new() -> Self {
        Self
    }

    /// File stem of a path-like value (`videos/Game (1).mp4` -> `Game (1)`)
    pub fn get_stem(&self, path: &str) -> Option<String> {
        Path::new(path.trim())
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
    }

    /// Make a value safe to use as a single path component
    pub fn sanitize_component(&self, value: &str) -> String {
        value
            .trim()
            .chars()
            .filter(|c| !matches!(c, '(' | ')'))
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_whitespace() => '_',
                c => c,
            })
            .collect()
    }

    /// Join a relative clip path onto the output directory, refusing escapes
    pub fn join_output(&self, output_dir: &Path, relative: &str) -> ClipEditorResult<PathBuf> {
        let relative = Path::new(relative);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)));
        if escapes || relative.as_os_str().is_empty() {
            return Err(ClipEditorError::Write {
                path: relative.display().to_string(),
                message: "output name must be a relative path inside the output directory"
                    .to_string(),
            });
        }
        Ok(output_dir.join(relative))
    }

    /// Create the parent directory of `path` if needed
    pub fn ensure_parent(&self, path: &Path) -> ClipEditorResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ClipEditorError::Write {
                path: path.display().to_string(),
                message: format!("cannot create directory {}: {}", parent.display(), e),
            })?;
        }
        Ok(())
    }
}
