//! Bitrate analysis module
//!
//! This module holds the pure stages of the analysis pipeline:
//! - Normalizing probe frame entries into frame records
//! - Building the per-frame bitrate series
//! - Smoothing it with a one-second frame window
//! - Summarizing it into statistics
//!
//! plus the JSON export and text summary built from a finished analysis.

mod export;
mod normalize;
mod report;
mod series;
mod statistics;
mod window;

pub use export::{ExportReport, ExportStatistics, TimelinePoint};
pub use normalize::{normalize_frames, resolve_timestamp};
pub use report::format_summary;
pub use series::{build_bitrate_series, frame_bitrate_mbps};
pub use statistics::calculate_statistics;
pub use window::{window_frames, windowed_average};
