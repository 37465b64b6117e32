//! Frame record normalization
//!
//! Turns validated probe entries into [`FrameRecord`]s with a finite time for
//! every frame. Some encoders leave presentation timestamps out for certain
//! frames; those are reconstructed from the frame index assuming constant fps.

use log::debug;

use crate::media::{ProbeFrame, RawScalar};
use crate::types::{FrameRecord, FrameType};

/// Parse a raw timestamp, or `None` if it must be reconstructed.
///
/// A present, non-empty value other than the literal string `"0"` is parsed
/// as seconds; values that fail to parse or are not finite are rejected.
fn parse_timestamp(raw: Option<&RawScalar>) -> Option<f64> {
    let parsed = match raw {
        Some(RawScalar::Number(n)) => Some(*n),
        Some(RawScalar::Text(s)) if !s.is_empty() && s != "0" => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|t| t.is_finite())
}

/// Resolve the timestamp of the entry at `index`, falling back to
/// `index / fps` when the raw value is unusable.
///
/// The flag is `true` when the time was reconstructed from the index.
pub fn resolve_timestamp(raw: Option<&RawScalar>, index: usize, fps: f64) -> (f64, bool) {
    match parse_timestamp(raw) {
        Some(time) => (time, false),
        None => (index as f64 / fps, true),
    }
}

/// Normalize probe entries into frame records, preserving probe order.
pub fn normalize_frames(entries: &[ProbeFrame], fps: f64) -> Vec<FrameRecord> {
    let mut reconstructed = 0usize;

    let frames: Vec<FrameRecord> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let (time, from_index) = resolve_timestamp(entry.timestamp.as_ref(), index, fps);
            if from_index {
                reconstructed += 1;
            }
            FrameRecord {
                time,
                size: entry.size.unwrap_or(0),
                frame_type: entry
                    .pict_type
                    .as_deref()
                    .and_then(FrameType::from_pict_type)
                    .unwrap_or(FrameType::P),
            }
        })
        .collect();

    if let (Some(first), Some(last)) = (frames.first(), frames.last()) {
        debug!(
            "Normalized {} frames ({} on the index timeline), time range: {:.2}s - {:.2}s",
            frames.len(),
            reconstructed,
            first.time,
            last.time
        );
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(timestamp: Option<RawScalar>, size: Option<u64>, pict_type: Option<&str>) -> ProbeFrame {
        ProbeFrame {
            timestamp,
            size,
            pict_type: pict_type.map(|s| s.to_string()),
        }
    }

    fn text(s: &str) -> Option<RawScalar> {
        Some(RawScalar::Text(s.to_string()))
    }

    #[test]
    fn test_resolve_parses_valid_timestamp() {
        assert_eq!(resolve_timestamp(text("1.25").as_ref(), 7, 24.0), (1.25, false));
        assert_eq!(
            resolve_timestamp(Some(&RawScalar::Number(2.5)), 7, 24.0),
            (2.5, false)
        );
    }

    #[test]
    fn test_resolve_literal_zero_uses_index() {
        // "0" at position 5 with 25 fps resolves to 5/25
        let (time, from_index) = resolve_timestamp(text("0").as_ref(), 5, 25.0);
        assert!((time - 0.2).abs() < 1e-12);
        assert!(from_index);
    }

    #[test]
    fn test_resolve_zero_with_decimals_is_parsed() {
        assert_eq!(resolve_timestamp(text("0.000000").as_ref(), 3, 25.0), (0.0, false));
    }

    #[test]
    fn test_resolve_fallbacks() {
        assert_eq!(resolve_timestamp(None, 10, 25.0), (0.4, true));
        assert_eq!(resolve_timestamp(text("").as_ref(), 10, 25.0), (0.4, true));
        assert_eq!(resolve_timestamp(text("N/A").as_ref(), 10, 25.0), (0.4, true));
        assert_eq!(resolve_timestamp(text("nan").as_ref(), 10, 25.0), (0.4, true));
        assert_eq!(resolve_timestamp(text("inf").as_ref(), 10, 25.0), (0.4, true));
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize_frames(&[], 24.0).is_empty());
    }

    #[test]
    fn test_normalize_defaults() {
        let entries = vec![
            entry(text("0.5"), None, None),
            entry(text("0.54"), Some(1200), Some("?")),
            entry(text("0.58"), Some(900), Some("B")),
            entry(text("0.62"), Some(800), Some("SI")),
        ];
        let frames = normalize_frames(&entries, 25.0);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].size, 0);
        assert_eq!(frames[0].frame_type, FrameType::P);
        assert_eq!(frames[1].frame_type, FrameType::P);
        assert_eq!(frames[2].frame_type, FrameType::B);
        assert_eq!(frames[3].frame_type, FrameType::Other);
    }

    #[test]
    fn test_normalize_index_counts_every_entry() {
        // Index keeps advancing across parsed and reconstructed entries
        let entries = vec![
            entry(text("0"), Some(100), Some("I")),
            entry(text("0.04"), Some(100), Some("P")),
            entry(None, Some(100), Some("P")),
            entry(text("garbage"), Some(100), Some("P")),
        ];
        let frames = normalize_frames(&entries, 25.0);
        assert_eq!(frames[0].time, 0.0);
        assert_eq!(frames[1].time, 0.04);
        assert!((frames[2].time - 2.0 / 25.0).abs() < 1e-12);
        assert!((frames[3].time - 3.0 / 25.0).abs() < 1e-12);
        assert!(frames.iter().all(|f| f.time.is_finite()));
    }
}
