//! ClipEditor Library
//!
//! Batch generation of video clips: a CSV table lists time ranges, one source
//! video is opened once, and every row becomes a clip file under the output
//! directory.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{edit_video, edit_video_with};
pub use config::Settings;
pub use domain::model::{ClipRange, ClipRow};
pub use engine::{ClipOutcome, VideoEditor};
pub use error::{ClipEditorError, ClipEditorResult};
