//! Clip table reader
//!
//! Streams rows from a CSV file with a header line. Each produced row carries
//! a Clip Name built by [`ClipNamer`] and made unique for the run by
//! [`NameRegistry`]. The sequence is single-pass: re-reading needs a new
//! [`ClipRowSource`].

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use tracing::{debug, warn};

use crate::config::{ClipNameSettings, ColumnSettings};
use crate::domain::model::ClipRow;
use crate::domain::rules::{ClipNamer, NameRegistry};
use crate::error::{ClipEditorError, ClipEditorResult};

/// Lazy, finite sequence of enriched clip rows
pub struct ClipRowSource {
    headers: Vec<String>,
    records: StringRecordsIntoIter<File>,
    columns: ColumnSettings,
    namer: ClipNamer,
    registry: NameRegistry,
}

impl ClipRowSource {
    /// Open the table and read its header line
    ///
    /// Only a missing file or unreadable header fails here, and both stop the
    /// run; bad rows fail when they are reached.
    pub fn open(
        path: &Path,
        columns: &ColumnSettings,
        naming: &ClipNameSettings,
    ) -> ClipEditorResult<Self> {
        if !path.is_file() {
            return Err(ClipEditorError::NotFound {
                path: path.display().to_string(),
            });
        }
        let file = File::open(path)?;

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(file);
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| {
                ClipEditorError::config(format!(
                    "clip table {} has an unreadable header: {}",
                    path.display(),
                    e
                ))
            })?
            .iter()
            .map(String::from)
            .collect();

        let namer = ClipNamer::new(naming.clone());
        let missing: Vec<&str> = [columns.start.as_str(), columns.end.as_str()]
            .into_iter()
            .chain(namer.required_columns())
            .filter(|column| !headers.iter().any(|h| h == column))
            .collect();
        if !missing.is_empty() {
            warn!(
                "Clip table {} has no column(s) {:?}; affected rows will fail",
                path.display(),
                missing
            );
        }
        debug!("Clip table {} columns: {:?}", path.display(), headers);

        Ok(Self {
            headers,
            records: reader.into_records(),
            columns: columns.clone(),
            namer,
            registry: NameRegistry::new(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn build_row(&mut self, record: csv::Result<StringRecord>) -> ClipEditorResult<ClipRow> {
        let record = record.map_err(|e| {
            ClipEditorError::row_format(e.position().map(|p| p.line()).unwrap_or(0), e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let fields: HashMap<String, String> = self
            .headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();

        let raw_start = fields.get(&self.columns.start).map(String::as_str);
        let raw_end = fields.get(&self.columns.end).map(String::as_str);
        for (column, value) in [(&self.columns.start, raw_start), (&self.columns.end, raw_end)] {
            if value.is_none() {
                return Err(ClipEditorError::row_format(
                    line,
                    format!("missing column '{}'", column),
                )
                .with_raw_times(raw_start, raw_end));
            }
        }

        let name = self
            .namer
            .name(line, &fields)
            .map_err(|e| e.with_raw_times(raw_start, raw_end))?;
        let clip_name = self.registry.claim(&name);
        Ok(ClipRow {
            line,
            fields,
            clip_name,
        })
    }
}

impl Iterator for ClipRowSource {
    type Item = ClipEditorResult<ClipRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(self.build_row(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_table(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("clips.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn open(path: &Path) -> ClipEditorResult<ClipRowSource> {
        ClipRowSource::open(path, &ColumnSettings::default(), &ClipNameSettings::default())
    }

    #[test]
    fn test_missing_table_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        match open(&temp.path().join("absent.csv")) {
            Err(ClipEditorError::NotFound { path }) => assert!(path.ends_with("absent.csv")),
            Err(other) => panic!("expected not found, got {:?}", other),
            Ok(_) => panic!("expected not found"),
        }
    }

    #[test]
    fn test_rows_are_enriched_with_clip_name() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_table(
            temp.path(),
            "From,To,Name,Play,Game,File\n\
             0:10,0:20,Jane Doe,Goal,Final,game.mp4\n\
             1:00,1:30,John Roe,Save,Final,game.mp4\n",
        );

        let rows: Vec<ClipRow> = open(&path).unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].clip_name, "game-Jane_Doe/game-Jane_Doe-Goal");
        assert_eq!(rows[0].get("From"), Some("0:10"));
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].clip_name, "game-John_Roe/game-John_Roe-Save");
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_duplicate_names_get_suffix() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_table(
            temp.path(),
            "From,To,Name,Play,File\n\
             0:10,0:20,Jane,Goal,g.mp4\n\
             0:30,0:40,Jane,Goal,g.mp4\n",
        );

        let names: Vec<String> = open(&path)
            .unwrap()
            .map(|row| row.unwrap().clip_name)
            .collect();
        assert_eq!(names, vec!["g-Jane/g-Jane-Goal", "g-Jane/g-Jane-Goal-2"]);
    }

    #[test]
    fn test_short_row_fails_lazily() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_table(
            temp.path(),
            "Name,Play,File,From,To\n\
             Jane,Goal,g.mp4,0:10,0:20\n\
             Jane,Miss,g.mp4,0:30\n\
             Jane,Save,g.mp4,0:50,1:00\n",
        );

        let results: Vec<_> = open(&path).unwrap().collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(ClipEditorError::RowFormat {
                line,
                message,
                start,
                end,
            }) => {
                assert_eq!(*line, 3);
                assert!(message.contains("'To'"));
                assert_eq!(start.as_deref(), Some("0:30"));
                assert_eq!(end.as_deref(), None);
            }
            other => panic!("expected row format error, got {:?}", other),
        }
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_missing_columns_fail_per_row_not_at_open() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_table(temp.path(), "Name,Play,File\nJane,Goal,g.mp4\n");

        let mut source = open(&path).unwrap();
        assert_eq!(source.headers(), ["Name", "Play", "File"]);
        assert!(matches!(
            source.next(),
            Some(Err(ClipEditorError::RowFormat { .. }))
        ));
        assert!(source.next().is_none());
    }

    #[test]
    fn test_naming_failure_keeps_raw_times() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_table(temp.path(), "From,To,Name,Play,File\n0:10,0:20,Jane\n");

        match open(&path).unwrap().next() {
            Some(Err(ClipEditorError::RowFormat {
                line,
                message,
                start,
                end,
            })) => {
                assert_eq!(line, 2);
                assert!(message.contains("missing column"));
                assert_eq!(start.as_deref(), Some("0:10"));
                assert_eq!(end.as_deref(), Some("0:20"));
            }
            other => panic!("expected row format error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_header_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("clips.csv");
        std::fs::write(&path, b"From,To,\xff\xfe\n0:10,0:20,x\n").unwrap();

        match open(&path) {
            Err(err @ ClipEditorError::Config { .. }) => assert!(err.is_fatal()),
            Err(other) => panic!("expected config error, got {:?}", other),
            Ok(_) => panic!("expected config error"),
        }
    }

    #[test]
    fn test_custom_columns() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_table(temp.path(), "Start,Stop,Label\n0:01,0:02,intro\n");
        let columns = ColumnSettings {
            start: "Start".to_string(),
            end: "Stop".to_string(),
        };
        let naming = ClipNameSettings {
            fields: vec!["Label".to_string()],
            directory_fields: vec![],
            file_fields: vec![],
            separator: "-".to_string(),
        };

        let row = ClipRowSource::open(&path, &columns, &naming)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(row.clip_name, "intro");
        assert_eq!(row.require("Stop").unwrap(), "0:02");
    }
}
