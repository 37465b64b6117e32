//! Windowed (smoothed) bitrate
//!
//! The window is a frame-count window of one second's worth of frames at the
//! nominal frame rate, slid over the series in frame order. Each averaged
//! point takes the timestamp of the frame at the centre of its window.
//!
//! A series no longer than one window is passed through unchanged.

use log::debug;

use crate::error::AnalysisError;
use crate::types::{BitrateSeries, WindowedSeries};

/// Number of frames in a one-second window: `round(fps)`, at least 1.
pub fn window_frames(fps: f64) -> Result<usize, AnalysisError> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "frame rate must be positive, got {}",
            fps
        )));
    }
    Ok((fps.round() as usize).max(1))
}

/// Centred moving average over `window_frames(fps)` consecutive frames.
pub fn windowed_average(series: &BitrateSeries, fps: f64) -> Result<WindowedSeries, AnalysisError> {
    let window = window_frames(fps)?;
    let len = series.len();

    if len <= window {
        debug!(
            "Series of {} frames fits in one {}-frame window, passing through",
            len, window
        );
        return Ok(WindowedSeries {
            times: series.times.clone(),
            bitrates_mbps: series.bitrates_mbps.clone(),
        });
    }

    let offset = window / 2;
    let bitrates_mbps: Vec<f64> = series
        .bitrates_mbps
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect();
    let times = series.times[offset..offset + bitrates_mbps.len()].to_vec();

    debug!(
        "Windowed {} frames into {} points ({}-frame window, offset {})",
        len,
        bitrates_mbps.len(),
        window,
        offset
    );

    Ok(WindowedSeries {
        times,
        bitrates_mbps,
    })
}
