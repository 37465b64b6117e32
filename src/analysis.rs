//! Analysis orchestration
//!
//! Sequences one analysis run: check the probe tool, read metadata, read
//! frames, then run the pure bitrate stages and assemble an [`AnalysisResult`].
//! Any failure aborts the whole run; there are no partial results.
//!
//! Progress is reported to a [`ProgressObserver`] at coarse milestones. The
//! observer only watches; it has no influence on the stages.

use log::{debug, info};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::bitrate::{build_bitrate_series, calculate_statistics, normalize_frames, windowed_average};
use crate::error::AnalysisError;
use crate::media::{parse_frames, parse_metadata, MediaProbe, ProbeFrame};
use crate::types::{AnalysisProgress, AnalysisResult, AnalysisStage, FrameType, VideoMetadata};

/// Receives ordered progress notifications during an analysis.
///
/// Implementations must be `Send + Sync`; analyses run off the caller's thread.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &AnalysisProgress);
}

/// Discards all progress notifications.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _progress: &AnalysisProgress) {}
}

struct ProgressReporter<'a> {
    observer: &'a dyn ProgressObserver,
    started: Instant,
}

impl ProgressReporter<'_> {
    fn emit(&self, stage: AnalysisStage) {
        debug!("Analysis stage: {:?} ({}%)", stage, stage.percentage());
        self.observer.on_progress(&AnalysisProgress {
            stage,
            percentage: stage.percentage(),
            message: stage.message().to_string(),
            elapsed_seconds: self.started.elapsed().as_secs_f64(),
        });
    }
}

fn check_cancelled(cancelled: &AtomicBool) -> Result<(), AnalysisError> {
    if cancelled.load(Ordering::SeqCst) {
        info!("Analysis cancelled");
        return Err(AnalysisError::Cancelled);
    }
    Ok(())
}

/// Run the pure pipeline stages over already-probed data.
pub fn build_result(
    source_path: &Path,
    metadata: VideoMetadata,
    entries: &[ProbeFrame],
) -> Result<AnalysisResult, AnalysisError> {
    let frames = normalize_frames(entries, metadata.fps);
    let bitrate_series = build_bitrate_series(&frames, metadata.fps)?;
    let windowed_series = windowed_average(&bitrate_series, metadata.fps)?;
    let frame_types: Vec<FrameType> = frames.iter().map(|f| f.frame_type).collect();
    let statistics = calculate_statistics(&bitrate_series, &frame_types)?;

    Ok(AnalysisResult {
        source_path: source_path.to_path_buf(),
        metadata,
        frames,
        bitrate_series,
        windowed_series,
        statistics,
    })
}

/// Analyze a file end to end.
///
/// `cancelled` is checked between stages; once set, the run stops with
/// [`AnalysisError::Cancelled`].
pub fn analyze_file(
    path: &Path,
    probe: &dyn MediaProbe,
    observer: &dyn ProgressObserver,
    cancelled: &AtomicBool,
) -> Result<AnalysisResult, AnalysisError> {
    let progress = ProgressReporter {
        observer,
        started: Instant::now(),
    };
    info!("Starting bitrate analysis: {}", path.display());

    progress.emit(AnalysisStage::CheckingTool);
    check_cancelled(cancelled)?;
    probe.ensure_available()?;

    progress.emit(AnalysisStage::ReadingMetadata);
    check_cancelled(cancelled)?;
    let metadata = parse_metadata(&probe.metadata_json(path)?)?;

    progress.emit(AnalysisStage::ReadingFrames);
    check_cancelled(cancelled)?;
    let entries = parse_frames(&probe.frames_json(path)?)?;

    progress.emit(AnalysisStage::CalculatingStatistics);
    check_cancelled(cancelled)?;
    let result = build_result(path, metadata, &entries)?;

    progress.emit(AnalysisStage::PreparingResults);
    check_cancelled(cancelled)?;

    progress.emit(AnalysisStage::Complete);
    info!(
        "Bitrate analysis complete for {} in {:.2}s: {} frames, {} windowed points",
        path.display(),
        progress.started.elapsed().as_secs_f64(),
        result.frames.len(),
        result.windowed_series.len()
    );
    Ok(result)
}

/// Analyze a file without progress reporting or cancellation.
pub fn analyze(path: &Path, probe: &dyn MediaProbe) -> Result<AnalysisResult, AnalysisError> {
    analyze_file(path, probe, &NoProgress, &AtomicBool::new(false))
}
