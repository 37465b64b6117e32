//! Per-frame bitrate series

use crate::error::AnalysisError;
use crate::types::{BitrateSeries, FrameRecord};

/// Bitrate in Mbps of a frame of `size_bytes` sustained for one frame interval.
pub fn frame_bitrate_mbps(size_bytes: u64, fps: f64) -> f64 {
    (size_bytes as f64 * 8.0 * fps) / 1_000_000.0
}

/// Build the instantaneous bitrate series, one point per frame.
///
/// `fps` must be finite and positive.
pub fn build_bitrate_series(frames: &[FrameRecord], fps: f64) -> Result<BitrateSeries, AnalysisError> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "frame rate must be positive, got {}",
            fps
        )));
    }

    Ok(BitrateSeries {
        times: frames.iter().map(|f| f.time).collect(),
        bitrates_mbps: frames
            .iter()
            .map(|f| frame_bitrate_mbps(f.size, fps))
            .collect(),
    })
}
