//! ClipEditor
//!
//! Cuts a batch of clips out of one source video.
//!
//! # Usage
//!
//! ```bash
//! clip-editor --config settings.yaml
//! clip-editor --config settings.yaml --clip-file plays.csv --log-level debug
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use clip_editor::cli::Cli;
use clip_editor::config_initialization::initialize_settings;
use clip_editor::edit_video;
use clip_editor::utils::logging::LoggingSystem;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match initialize_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            LoggingSystem::initialize_console_fallback();
            error!("{}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = LoggingSystem::new(settings.logging.clone(), &settings.log_file).initialize() {
        LoggingSystem::initialize_console_fallback();
        error!("Cannot set up logging: {}", e);
        return Err(e.into());
    }

    if let Err(e) = edit_video(&settings) {
        if e.is_fatal() {
            error!("Aborting before any clip was processed: {}", e);
        } else {
            error!("Batch aborted: {}", e);
        }
        return Err(e.into());
    }

    info!("ClipEditor completed");
    Ok(())
}
