//! Media probing module
//!
//! This module handles everything that touches the external probing tool:
//! - Finding the ffprobe binary and checking it is invocable
//! - Running the metadata and frame queries with a timeout
//! - Parsing ffprobe JSON into typed, validated structures

mod probe;
mod raw;
mod tools;

pub use probe::{FfprobeProbe, MediaProbe};
pub use raw::{parse_frame_rate, parse_frames, parse_metadata, ProbeFrame, RawScalar, DEFAULT_FRAME_RATE};
pub use tools::{check_command, find_command, get_search_paths, install_hint};
