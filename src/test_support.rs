//! In-memory probe and canned ffprobe output for tests

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::analysis::ProgressObserver;
use crate::error::AnalysisError;
use crate::media::MediaProbe;
use crate::types::AnalysisProgress;

/// Metadata query output for a single video stream.
pub fn metadata_json(r_frame_rate: &str) -> String {
    serde_json::json!({
        "streams": [{
            "index": 0,
            "codec_type": "video",
            "codec_name": "prores",
            "codec_long_name": "Apple ProRes (iCodec Pro)",
            "width": 1920,
            "height": 1080,
            "r_frame_rate": r_frame_rate
        }],
        "format": {"duration": "1.166667", "size": "4375000", "bit_rate": "30000000"}
    })
    .to_string()
}

/// Frame query output from `(timestamp, size, pict_type)` triples.
pub fn frames_json(frames: &[(Option<&str>, u64, &str)]) -> String {
    let frames: Vec<serde_json::Value> = frames
        .iter()
        .map(|(ts, size, pict_type)| {
            let mut frame = serde_json::json!({
                "pkt_size": size.to_string(),
                "pict_type": pict_type,
            });
            if let Some(ts) = ts {
                frame["pkt_pts_time"] = serde_json::Value::String(ts.to_string());
            }
            frame
        })
        .collect();
    serde_json::json!({ "frames": frames }).to_string()
}

pub struct FakeProbe {
    pub available: bool,
    pub metadata: Result<String, String>,
    pub frames: Result<String, String>,
    pub metadata_calls: AtomicUsize,
    pub frame_calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new(metadata: String, frames: String) -> Self {
        Self {
            available: true,
            metadata: Ok(metadata),
            frames: Ok(frames),
            metadata_calls: AtomicUsize::new(0),
            frame_calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(String::new(), String::new())
        }
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn frame_calls(&self) -> usize {
        self.frame_calls.load(Ordering::SeqCst)
    }
}

impl MediaProbe for FakeProbe {
    fn ensure_available(&self) -> Result<(), AnalysisError> {
        if self.available {
            Ok(())
        } else {
            Err(AnalysisError::ProbeToolUnavailable {
                tool: "FFprobe".to_string(),
                hint: "Install with: brew install ffmpeg".to_string(),
            })
        }
    }

    fn metadata_json(&self, _path: &Path) -> Result<String, AnalysisError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata
            .clone()
            .map_err(|reason| AnalysisError::ProbeFailed {
                query: "metadata",
                reason,
            })
    }

    fn frames_json(&self, _path: &Path) -> Result<String, AnalysisError> {
        self.frame_calls.fetch_add(1, Ordering::SeqCst);
        self.frames.clone().map_err(|reason| AnalysisError::ProbeFailed {
            query: "frames",
            reason,
        })
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<AnalysisProgress>>,
}

impl RecordingObserver {
    pub fn percentages(&self) -> Vec<u8> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.percentage)
            .collect()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, progress: &AnalysisProgress) {
        self.events.lock().unwrap().push(progress.clone());
    }
}
