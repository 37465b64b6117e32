//! Typed ffprobe output
//!
//! ffprobe JSON is deserialized into the structures below and validated here,
//! so the analysis stages never touch untyped JSON. Malformed metadata maps to
//! `MetadataParseError`, malformed frame output to `FrameParseError`.

use log::{debug, warn};
use serde::Deserialize;

use crate::error::AnalysisError;
use crate::types::VideoMetadata;

/// Frame rate assumed when a stream does not report `r_frame_rate`.
pub const DEFAULT_FRAME_RATE: &str = "24/1";

/// A scalar that ffprobe emits either as a JSON string or a JSON number,
/// depending on field and version.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Number(f64),
    Text(String),
}

impl RawScalar {
    fn as_f64(&self) -> Option<f64> {
        match self {
            RawScalar::Number(n) => Some(*n),
            RawScalar::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    fn describe(&self) -> String {
        match self {
            RawScalar::Number(n) => n.to_string(),
            RawScalar::Text(s) => format!("{:?}", s),
        }
    }
}

// ============================================================================
// Metadata (-show_format -show_streams)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawProbeOutput {
    #[serde(default)]
    streams: Vec<RawStream>,
    format: Option<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_long_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    duration: Option<RawScalar>,
    size: Option<RawScalar>,
    bit_rate: Option<RawScalar>,
}

/// Parse a rational frame rate such as `"30000/1001"`.
///
/// A bare number (`"25"`) is accepted as well. The result must be a finite,
/// positive rate.
pub fn parse_frame_rate(rate: &str) -> Result<f64, AnalysisError> {
    let invalid = || AnalysisError::MetadataParseError(format!("invalid frame rate {:?}", rate));

    let fps = match rate.trim().split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().map_err(|_| invalid())?;
            let den = den.trim().parse::<f64>().map_err(|_| invalid())?;
            num / den
        }
        None => rate.trim().parse::<f64>().map_err(|_| invalid())?,
    };

    if !fps.is_finite() || fps <= 0.0 {
        return Err(invalid());
    }
    Ok(fps)
}

fn format_number(
    value: &Option<RawScalar>,
    field: &str,
) -> Result<f64, AnalysisError> {
    match value {
        None => Ok(0.0),
        Some(raw) => raw.as_f64().filter(|v| v.is_finite()).ok_or_else(|| {
            AnalysisError::MetadataParseError(format!(
                "format.{} is not a number: {}",
                field,
                raw.describe()
            ))
        }),
    }
}

/// Parse the metadata query output into [`VideoMetadata`].
///
/// The first stream with `codec_type == "video"` is used.
pub fn parse_metadata(json: &str) -> Result<VideoMetadata, AnalysisError> {
    if json.trim().is_empty() {
        return Err(AnalysisError::MetadataParseError(
            "ffprobe returned empty output".to_string(),
        ));
    }

    let parsed: RawProbeOutput = serde_json::from_str(json)
        .map_err(|e| AnalysisError::MetadataParseError(format!("invalid JSON: {}", e)))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| AnalysisError::MetadataParseError("no video stream found".to_string()))?;

    let format = parsed
        .format
        .as_ref()
        .ok_or_else(|| AnalysisError::MetadataParseError("missing format section".to_string()))?;

    let rate = video.r_frame_rate.as_deref().unwrap_or(DEFAULT_FRAME_RATE);
    let fps = parse_frame_rate(rate)?;

    let metadata = VideoMetadata {
        codec: video
            .codec_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        codec_long: video
            .codec_long_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        fps,
        duration: format_number(&format.duration, "duration")?,
        size: format_number(&format.size, "size")?.max(0.0) as u64,
        bitrate: format_number(&format.bit_rate, "bit_rate")?.max(0.0) as u64,
    };

    debug!(
        "Parsed metadata: codec={}, {}x{}, fps={:.3}, duration={:.2}s",
        metadata.codec, metadata.width, metadata.height, metadata.fps, metadata.duration
    );
    Ok(metadata)
}

// ============================================================================
// Frames (-show_entries frame=...)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawFramesOutput {
    #[serde(default)]
    frames: Vec<RawFrame>,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    pkt_pts_time: Option<RawScalar>,
    pts_time: Option<RawScalar>,
    best_effort_timestamp_time: Option<RawScalar>,
    pkt_size: Option<RawScalar>,
    pict_type: Option<String>,
}

/// One validated frame entry, before timestamp resolution and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeFrame {
    /// Raw presentation timestamp, as reported
    pub timestamp: Option<RawScalar>,
    /// Packet size in bytes, clamped to be non-negative
    pub size: Option<u64>,
    pub pict_type: Option<String>,
}

fn coerce_size(index: usize, raw: &RawScalar) -> Result<u64, AnalysisError> {
    let invalid = || {
        AnalysisError::FrameParseError(format!(
            "frame {}: invalid pkt_size {}",
            index,
            raw.describe()
        ))
    };

    match raw {
        RawScalar::Number(n) if n.is_finite() => Ok(n.max(0.0) as u64),
        RawScalar::Number(_) => Err(invalid()),
        RawScalar::Text(s) => {
            let value = s.trim().parse::<i64>().map_err(|_| invalid())?;
            Ok(value.max(0) as u64)
        }
    }
}

/// Parse the frame query output into validated [`ProbeFrame`]s, in probe order.
///
/// A missing `frames` array is treated as a video with no frames.
pub fn parse_frames(json: &str) -> Result<Vec<ProbeFrame>, AnalysisError> {
    if json.trim().is_empty() {
        return Err(AnalysisError::FrameParseError(
            "ffprobe returned empty output".to_string(),
        ));
    }

    let parsed: RawFramesOutput = serde_json::from_str(json)
        .map_err(|e| AnalysisError::FrameParseError(format!("invalid JSON: {}", e)))?;

    let mut frames = Vec::with_capacity(parsed.frames.len());
    for (index, raw) in parsed.frames.into_iter().enumerate() {
        let size = raw
            .pkt_size
            .as_ref()
            .map(|s| coerce_size(index, s))
            .transpose()?;
        let timestamp = raw
            .pkt_pts_time
            .or(raw.pts_time)
            .or(raw.best_effort_timestamp_time);

        frames.push(ProbeFrame {
            timestamp,
            size,
            pict_type: raw.pict_type,
        });
    }

    if frames.is_empty() {
        warn!("ffprobe reported no video frames");
    } else {
        debug!("Parsed {} raw frame entries", frames.len());
    }
    Ok(frames)
}
