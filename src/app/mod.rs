// Application layer - batch use case

pub mod batch_interactor;

pub use batch_interactor::{edit_video, edit_video_with};
