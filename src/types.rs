//! Shared types and data structures for bitrate analysis

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Frame Types
// ============================================================================

/// Picture type of a single frame as reported by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    I,
    P,
    B,
    Other,
}

impl FrameType {
    /// Map an ffprobe `pict_type` code. Returns `None` for codes that are not
    /// picture types at all ("?", empty, garbage).
    pub fn from_pict_type(code: &str) -> Option<Self> {
        match code.trim() {
            "I" => Some(FrameType::I),
            "P" => Some(FrameType::P),
            "B" => Some(FrameType::B),
            "S" | "SI" | "SP" | "BI" => Some(FrameType::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Presentation time in seconds
    pub time: f64,
    /// Packet size in bytes
    pub size: u64,
    pub frame_type: FrameType,
}

// ============================================================================
// Video Metadata
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub codec: String,
    pub codec_long: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container duration in seconds
    pub duration: f64,
    /// Total file size in bytes
    pub size: u64,
    /// Overall container bitrate in bits/sec
    pub bitrate: u64,
}

// ============================================================================
// Bitrate Series Types
// ============================================================================

/// Instantaneous per-frame bitrate, one entry per frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BitrateSeries {
    pub times: Vec<f64>,
    pub bitrates_mbps: Vec<f64>,
}

impl BitrateSeries {
    pub fn len(&self) -> usize {
        self.bitrates_mbps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitrates_mbps.is_empty()
    }
}

/// Moving average of a [`BitrateSeries`], each point placed at the time of
/// the frame at the centre of its window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowedSeries {
    pub times: Vec<f64>,
    pub bitrates_mbps: Vec<f64>,
}

impl WindowedSeries {
    pub fn len(&self) -> usize {
        self.bitrates_mbps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitrates_mbps.is_empty()
    }

    /// Iterate `(time, bitrate_mbps)` pairs in order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times
            .iter()
            .copied()
            .zip(self.bitrates_mbps.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitrateStatistics {
    pub avg_bitrate: f64,
    pub max_bitrate: f64,
    pub min_bitrate: f64,
    /// Population standard deviation
    pub std_bitrate: f64,
    pub frame_count: usize,
    pub i_frame_count: usize,
    /// Average number of frames between I-frames
    pub i_frame_interval: f64,
    pub frame_types: Vec<FrameType>,
}

// ============================================================================
// Analysis Result Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub source_path: PathBuf,
    pub metadata: VideoMetadata,
    pub frames: Vec<FrameRecord>,
    pub bitrate_series: BitrateSeries,
    pub windowed_series: WindowedSeries,
    /// `None` when the video produced no frames
    pub statistics: Option<BitrateStatistics>,
}

// ============================================================================
// Progress Types
// ============================================================================

/// Coarse milestones of an analysis run, in the order they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    CheckingTool,
    ReadingMetadata,
    ReadingFrames,
    CalculatingStatistics,
    PreparingResults,
    Complete,
}

impl AnalysisStage {
    pub fn percentage(&self) -> u8 {
        match self {
            AnalysisStage::CheckingTool => 10,
            AnalysisStage::ReadingMetadata => 20,
            AnalysisStage::ReadingFrames => 40,
            AnalysisStage::CalculatingStatistics => 70,
            AnalysisStage::PreparingResults => 90,
            AnalysisStage::Complete => 100,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AnalysisStage::CheckingTool => "Checking FFprobe availability...",
            AnalysisStage::ReadingMetadata => "Extracting video metadata...",
            AnalysisStage::ReadingFrames => "Analyzing frame data...",
            AnalysisStage::CalculatingStatistics => "Calculating statistics...",
            AnalysisStage::PreparingResults => "Preparing results...",
            AnalysisStage::Complete => "Analysis complete!",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisProgress {
    pub stage: AnalysisStage,
    pub percentage: u8,
    pub message: String,
    /// Elapsed seconds since analysis started
    pub elapsed_seconds: f64,
}

// ============================================================================
// Job Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub job_id: String,
    pub path: PathBuf,
    pub running_seconds: f64,
}

// ============================================================================
// Dependency Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    pub name: String,
    pub installed: bool,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependenciesResult {
    pub all_installed: bool,
    pub dependencies: Vec<DependencyStatus>,
    pub platform: String,
}
