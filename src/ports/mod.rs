// Ports - media engine contracts used by the Video Editor

use std::path::Path;

use crate::config::ExportSettings;
use crate::domain::model::ClipRange;
use crate::error::ClipEditorResult;

/// Opens source videos
pub trait MediaPort {
    type Source: SourceVideo;

    /// Open `path` once for a whole run
    ///
    /// Fails with `SourceNotFound` when the path is missing or unreadable.
    fn open(&self, path: &Path, export: &ExportSettings) -> ClipEditorResult<Self::Source>;
}

/// An open source video
///
/// Dropping the value releases the underlying handle.
pub trait SourceVideo {
    /// Length in seconds, if the container reports one
    fn duration(&self) -> Option<f64>;

    /// Write `range` of this source to `output`
    ///
    /// `output` already exists as an empty placeholder and is overwritten.
    fn export_range(&mut self, range: &ClipRange, output: &Path) -> ClipEditorResult<()>;
}
