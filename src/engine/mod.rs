//! Clip export engine
//!
//! [`VideoEditor`] holds the one open source video of a run and turns
//! `minutes:seconds` pairs into finished clip files.

pub mod clipper;

pub use clipper::{ClipOutcome, VideoEditor};
