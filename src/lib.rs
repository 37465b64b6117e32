//! bitrate-analyzer - per-frame and windowed bitrate analysis of video files
//!
//! Frame data comes from `ffprobe`; everything after the probe is pure.
//! The crate exposes the pipeline stages individually, an orchestrator that
//! runs them in order, and a single-slot job queue that runs the orchestrator
//! off the caller's thread.

// Module declarations
pub mod analysis;
pub mod bitrate;
pub mod commands;
pub mod config;
pub mod error;
pub mod jobs;
pub mod media;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use analysis::{analyze, analyze_file, build_result, NoProgress, ProgressObserver};
pub use config::AnalyzerConfig;
pub use error::AnalysisError;
pub use jobs::{compute_file_hash, AnalysisEvent, AnalysisHandle, AnalysisQueue};
pub use media::{FfprobeProbe, MediaProbe};
pub use types::*;
