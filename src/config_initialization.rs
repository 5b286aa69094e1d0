//! Configuration hierarchy: CLI > environment > settings file > defaults

use tracing::debug;

use crate::cli::Cli;
use crate::config::Settings;
use crate::error::ClipEditorResult;

/// Load the settings file named on the command line and apply overrides
///
/// Environment variables reach this point through clap, so a flag and its
/// variable are one override.
pub fn initialize_settings(cli: &Cli) -> ClipEditorResult<Settings> {
    let mut settings = Settings::load(&cli.config)?;
    apply_cli_overrides(&mut settings, cli);
    settings.validate()?;
    Ok(settings)
}

/// Apply command-line overrides to loaded settings
pub fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(source) = &cli.source {
        debug!("Override: source_video = {}", source.display());
        settings.source_video = source.clone();
    }
    if let Some(clip_file) = &cli.clip_file {
        debug!("Override: clip_file = {}", clip_file.display());
        settings.clip_file = clip_file.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        debug!("Override: output_dir = {}", output_dir.display());
        settings.output_dir = output_dir.clone();
    }
    // RUST_LOG still wins over this inside the logging filter.
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
}
