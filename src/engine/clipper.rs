//! Video editor: one open source video, many clips

use std::path::{Path, PathBuf};
use std::time::Instant;

use tempfile::Builder;
use tracing::{debug, info};

use crate::config::{OverwritePolicy, Settings};
use crate::domain::model::ClipRange;
use crate::error::{ClipEditorError, ClipEditorResult};
use crate::ports::{MediaPort, SourceVideo};
use crate::utils::path::PathUtils;

/// Result of a single `create_clip` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipOutcome {
    /// The clip was exported to the target path
    Written { range: ClipRange },
    /// The target already existed and was left untouched
    Skipped,
}

/// Owns the open source video for a whole run
///
/// The source is released when the editor is dropped, on every exit path.
pub struct VideoEditor<S: SourceVideo> {
    source_path: PathBuf,
    source: S,
    overwrite: OverwritePolicy,
    paths: PathUtils,
}

impl<S: SourceVideo> VideoEditor<S> {
    /// Open `source_path` through `port`
    pub fn open<P>(port: &P, source_path: &Path, settings: &Settings) -> ClipEditorResult<Self>
    where
        P: MediaPort<Source = S>,
    {
        let source = port.open(source_path, &settings.export)?;
        Ok(Self::with_source(source_path, source, settings.overwrite))
    }

    /// Wrap an already opened source
    pub fn with_source(source_path: &Path, source: S, overwrite: OverwritePolicy) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            source,
            overwrite,
            paths: PathUtils::new(),
        }
    }

    /// Cut `[start, end)` out of the source and write it to `output_file`
    ///
    /// `start` and `end` are `minutes:seconds`. The target is either written
    /// completely or not touched at all.
    pub fn create_clip(
        &mut self,
        start: &str,
        end: &str,
        output_file: &Path,
    ) -> ClipEditorResult<ClipOutcome> {
        let range = ClipRange::parse(start, end)?;
        range.validate_against_duration(self.source.duration())?;

        if self.overwrite == OverwritePolicy::Never && output_file.exists() {
            debug!("{} exists, leaving it in place", output_file.display());
            return Ok(ClipOutcome::Skipped);
        }

        self.paths.ensure_parent(output_file)?;
        let write_err = |message: String| ClipEditorError::Write {
            path: output_file.display().to_string(),
            message,
        };

        let parent = match output_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let suffix = output_file
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        // Export into a hidden sibling; dropping the TempPath deletes it.
        let staging = Builder::new()
            .prefix(".clip-")
            .suffix(&suffix)
            .tempfile_in(parent)
            .map_err(|e| write_err(e.to_string()))?
            .into_temp_path();

        let started = Instant::now();
        self.source.export_range(&range, &staging)?;
        staging
            .persist(output_file)
            .map_err(|e| write_err(e.error.to_string()))?;

        debug!(
            "Exported {} to {} in {:.2}s",
            range,
            output_file.display(),
            started.elapsed().as_secs_f64()
        );
        Ok(ClipOutcome::Written { range })
    }
}

impl<S: SourceVideo> Drop for VideoEditor<S> {
    fn drop(&mut self) {
        info!("Releasing source video {}", self.source_path.display());
    }
}
