// Batch interactor - one pass over the clip table against one open source video

use std::path::PathBuf;

use tracing::{error, info};

use crate::adapters::{ClipRowSource, LibavMediaPort};
use crate::config::Settings;
use crate::domain::model::{ClipRange, ClipRow};
use crate::domain::rules::OutputNamer;
use crate::engine::{ClipOutcome, VideoEditor};
use crate::error::{ClipEditorError, ClipEditorResult};
use crate::ports::{MediaPort, SourceVideo};
use crate::utils::path::PathUtils;

/// Run the batch with the libav media engine
pub fn edit_video(settings: &Settings) -> ClipEditorResult<()> {
    let port = LibavMediaPort::new()?;
    edit_video_with(settings, &port)
}

/// Run the batch against any media engine
///
/// Only a missing clip table or source video is returned as an error; every
/// per-row failure is logged and the next row is attempted.
pub fn edit_video_with<P: MediaPort>(settings: &Settings, port: &P) -> ClipEditorResult<()> {
    info!(
        "Starting batch: clip table {}, source {}, output {}",
        settings.clip_file.display(),
        settings.source_video.display(),
        settings.output_dir.display()
    );

    let rows = ClipRowSource::open(&settings.clip_file, &settings.columns, &settings.clip_name)?;
    let mut editor = VideoEditor::open(port, &settings.source_video, settings)?;
    let batch = BatchRun::new(settings);

    let mut tally = Tally::default();
    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(ClipEditorError::RowFormat {
                line,
                message,
                start,
                end,
            }) => {
                error!(
                    "Skipping malformed row (line {}, {}={:?}, {}={:?}): {}",
                    line,
                    settings.columns.start,
                    start.as_deref().unwrap_or_default(),
                    settings.columns.end,
                    end.as_deref().unwrap_or_default(),
                    message
                );
                tally.failed += 1;
                continue;
            }
            Err(e) => {
                error!("Skipping row: {}", e);
                tally.failed += 1;
                continue;
            }
        };

        match batch.process_row(&mut editor, &row) {
            Ok((path, ClipOutcome::Written { range })) => {
                info!("Created clip {} [{}] -> {}", row.clip_name, range, path.display());
                tally.written += 1;
            }
            Ok((path, ClipOutcome::Skipped)) => {
                info!("Clip {} already exists at {}, skipped", row.clip_name, path.display());
                tally.skipped += 1;
            }
            Err(e) => {
                error!(
                    "Failed to create clip {} (line {}, {}={:?}, {}={:?}): {}",
                    row.clip_name,
                    row.line,
                    settings.columns.start,
                    row.get(&settings.columns.start).unwrap_or_default(),
                    settings.columns.end,
                    row.get(&settings.columns.end).unwrap_or_default(),
                    e
                );
                tally.failed += 1;
            }
        }
    }

    drop(editor);
    info!(
        "Batch finished: {} written, {} skipped, {} failed",
        tally.written, tally.skipped, tally.failed
    );
    Ok(())
}

#[derive(Debug, Default)]
struct Tally {
    written: usize,
    skipped: usize,
    failed: usize,
}

/// Per-run values shared by every row
struct BatchRun<'a> {
    settings: &'a Settings,
    namer: OutputNamer,
    paths: PathUtils,
}

impl<'a> BatchRun<'a> {
    fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            namer: OutputNamer::new(settings.output_pattern.clone()),
            paths: PathUtils::new(),
        }
    }

    fn process_row<S: SourceVideo>(
        &self,
        editor: &mut VideoEditor<S>,
        row: &ClipRow,
    ) -> ClipEditorResult<(PathBuf, ClipOutcome)> {
        let start = row.require(&self.settings.columns.start)?;
        let end = row.require(&self.settings.columns.end)?;

        let range = ClipRange::parse(start, end)?;
        let relative = self.namer.render(&row.clip_name, &range);
        let output = self.paths.join_output(&self.settings.output_dir, &relative)?;

        let outcome = editor.create_clip(start, end, &output)?;
        Ok((output, outcome))
    }
}
