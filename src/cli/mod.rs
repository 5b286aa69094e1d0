//! CLI module for ClipEditor
//!
//! Command-line arguments; every flag is an override on top of the settings file.

use std::path::PathBuf;

use clap::Parser;

use crate::utils::logging::LogLevel;

/// ClipEditor
///
/// Cuts every clip listed in a CSV table out of one source video.
#[derive(Parser, Debug)]
#[command(name = "clip-editor")]
#[command(about = "Batch video clip generation from a table of time ranges")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Settings file (YAML, or TOML with a .toml extension)
    #[arg(short, long, default_value = "settings.yaml")]
    pub config: PathBuf,

    /// Logging level; RUST_LOG takes precedence
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// Source video, overriding source_video
    #[arg(long, env = "CLIP_EDITOR_SOURCE")]
    pub source: Option<PathBuf>,

    /// Clip table, overriding clip_file
    #[arg(long, env = "CLIP_EDITOR_CLIP_FILE")]
    pub clip_file: Option<PathBuf>,

    /// Output directory, overriding output_dir
    #[arg(long, env = "CLIP_EDITOR_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["clip-editor"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("settings.yaml"));
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_overrides_parse() {
        let cli = Cli::try_parse_from([
            "clip-editor",
            "--config",
            "run.toml",
            "--log-level",
            "debug",
            "--clip-file",
            "clips.csv",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("run.toml"));
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.clip_file, Some(PathBuf::from("clips.csv")));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        assert!(Cli::try_parse_from(["clip-editor", "--log-level", "loud"]).is_err());
    }
}
