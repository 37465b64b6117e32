//! JSON export of an analysis
//!
//! The export timeline is the windowed series, not the per-frame one.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AnalysisError;
use crate::types::{AnalysisResult, BitrateStatistics, VideoMetadata};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportStatistics {
    pub avg_bitrate_mbps: f64,
    pub max_bitrate_mbps: f64,
    pub min_bitrate_mbps: f64,
    pub std_bitrate_mbps: f64,
    pub frame_count: usize,
    pub i_frame_count: usize,
}

impl From<&BitrateStatistics> for ExportStatistics {
    fn from(stats: &BitrateStatistics) -> Self {
        Self {
            avg_bitrate_mbps: stats.avg_bitrate,
            max_bitrate_mbps: stats.max_bitrate,
            min_bitrate_mbps: stats.min_bitrate,
            std_bitrate_mbps: stats.std_bitrate,
            frame_count: stats.frame_count,
            i_frame_count: stats.i_frame_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub time: f64,
    pub bitrate_mbps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    pub source_file: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub metadata: VideoMetadata,
    /// `None` when the video had no frames
    pub statistics: Option<ExportStatistics>,
    pub timeline: Vec<TimelinePoint>,
}

impl ExportReport {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            source_file: result.source_path.clone(),
            generated_at: Utc::now(),
            metadata: result.metadata.clone(),
            statistics: result.statistics.as_ref().map(ExportStatistics::from),
            timeline: result
                .windowed_series
                .points()
                .map(|(time, bitrate_mbps)| TimelinePoint { time, bitrate_mbps })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), AnalysisError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        info!(
            "Exported analysis of {} to {} ({} timeline points)",
            self.source_file.display(),
            path.display(),
            self.timeline.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BitrateSeries, FrameType, WindowedSeries};

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            source_path: PathBuf::from("/media/clip.mov"),
            metadata: VideoMetadata {
                codec: "prores".to_string(),
                codec_long: "Apple ProRes (iCodec Pro)".to_string(),
                width: 1920,
                height: 1080,
                fps: 24.0,
                duration: 1.5,
                size: 1_000_000,
                bitrate: 5_333_333,
            },
            frames: Vec::new(),
            bitrate_series: BitrateSeries {
                times: vec![0.0, 0.5, 1.0, 1.5],
                bitrates_mbps: vec![1.0, 2.0, 3.0, 4.0],
            },
            windowed_series: WindowedSeries {
                times: vec![0.5, 1.0],
                bitrates_mbps: vec![1.5, 2.5],
            },
            statistics: Some(BitrateStatistics {
                avg_bitrate: 2.5,
                max_bitrate: 4.0,
                min_bitrate: 1.0,
                std_bitrate: 1.118,
                frame_count: 4,
                i_frame_count: 1,
                i_frame_interval: 4.0,
                frame_types: vec![FrameType::I, FrameType::P, FrameType::P, FrameType::P],
            }),
        }
    }

    #[test]
    fn test_timeline_comes_from_windowed_series() {
        let report = ExportReport::from_result(&sample_result());
        assert_eq!(
            report.timeline,
            vec![
                TimelinePoint { time: 0.5, bitrate_mbps: 1.5 },
                TimelinePoint { time: 1.0, bitrate_mbps: 2.5 },
            ]
        );
    }

    #[test]
    fn test_export_json_fields() {
        let report = ExportReport::from_result(&sample_result());
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["source_file"], "/media/clip.mov");
        assert_eq!(value["metadata"]["codec"], "prores");
        assert_eq!(value["statistics"]["avg_bitrate_mbps"], 2.5);
        assert_eq!(value["statistics"]["i_frame_count"], 1);
        assert_eq!(value["timeline"][1]["bitrate_mbps"], 2.5);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_export_without_statistics() {
        let mut result = sample_result();
        result.statistics = None;
        result.windowed_series = WindowedSeries::default();
        let report = ExportReport::from_result(&result);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value["statistics"].is_null());
        assert_eq!(value["timeline"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("clip.json");
        let report = ExportReport::from_result(&sample_result());
        report.write_to(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let loaded: ExportReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(loaded, report);
    }
}
