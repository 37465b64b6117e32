//! Bitrate statistics calculation

use log::debug;

use crate::error::AnalysisError;
use crate::types::{BitrateSeries, BitrateStatistics, FrameType};

/// Summarize a per-frame bitrate series.
///
/// Returns `Ok(None)` for an empty series rather than aggregates over nothing.
/// `frame_types` must be parallel to the series; a length mismatch is
/// `InvalidInput`.
pub fn calculate_statistics(
    series: &BitrateSeries,
    frame_types: &[FrameType],
) -> Result<Option<BitrateStatistics>, AnalysisError> {
    let bitrates = &series.bitrates_mbps;
    if frame_types.len() != bitrates.len() {
        return Err(AnalysisError::InvalidInput(format!(
            "{} frame types for {} bitrate samples",
            frame_types.len(),
            bitrates.len()
        )));
    }
    if bitrates.is_empty() {
        debug!("No bitrate data to calculate statistics");
        return Ok(None);
    }

    let count = bitrates.len() as f64;
    let avg_bitrate = bitrates.iter().sum::<f64>() / count;
    let max_bitrate = bitrates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_bitrate = bitrates.iter().copied().fold(f64::INFINITY, f64::min);

    let variance = bitrates
        .iter()
        .map(|&b| {
            let diff = b - avg_bitrate;
            diff * diff
        })
        .sum::<f64>()
        / count;
    let std_bitrate = variance.sqrt();

    let frame_count = bitrates.len();
    let i_frame_count = frame_types.iter().filter(|&&t| t == FrameType::I).count();
    let i_frame_interval = frame_count as f64 / i_frame_count.max(1) as f64;

    debug!(
        "Statistics calculated: avg={:.3}, max={:.3}, min={:.3}, std={:.3} Mbps, frames={}, I-frames={}",
        avg_bitrate, max_bitrate, min_bitrate, std_bitrate, frame_count, i_frame_count
    );

    Ok(Some(BitrateStatistics {
        avg_bitrate,
        max_bitrate,
        min_bitrate,
        std_bitrate,
        frame_count,
        i_frame_count,
        i_frame_interval,
        frame_types: frame_types.to_vec(),
    }))
}
