//! Plain-text summary of an analysis

use std::fmt::Write;

use crate::types::AnalysisResult;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Render the human-readable summary printed after an analysis.
pub fn format_summary(result: &AnalysisResult) -> String {
    let metadata = &result.metadata;
    let file_name = result
        .source_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| result.source_path.display().to_string());

    let mut out = String::new();
    // Writing into a String can't fail
    let _ = writeln!(out, "VIDEO INFORMATION");
    let _ = writeln!(out, "File: {}", file_name);
    let _ = writeln!(out, "Codec: {}", metadata.codec_long);
    let _ = writeln!(out, "Resolution: {}x{}", metadata.width, metadata.height);
    let _ = writeln!(out, "Frame Rate: {:.2} fps", metadata.fps);
    let _ = writeln!(out, "Duration: {:.2} seconds", metadata.duration);
    let _ = writeln!(out, "Total Size: {:.2} GB", metadata.size as f64 / BYTES_PER_GB);
    let _ = writeln!(out);

    let Some(stats) = &result.statistics else {
        let _ = writeln!(out, "BITRATE STATISTICS");
        let _ = writeln!(out, "No frame data");
        let _ = write!(
            out,
            "Overall File Bitrate: {:.2} Mbps",
            metadata.bitrate as f64 / 1_000_000.0
        );
        return out;
    };

    let _ = writeln!(out, "BITRATE STATISTICS");
    let _ = writeln!(out, "Average Bitrate: {:.2} Mbps", stats.avg_bitrate);
    let _ = writeln!(out, "Maximum Bitrate: {:.2} Mbps", stats.max_bitrate);
    let _ = writeln!(out, "Minimum Bitrate: {:.2} Mbps", stats.min_bitrate);
    let _ = writeln!(out, "Std Deviation: {:.2} Mbps", stats.std_bitrate);
    let _ = writeln!(
        out,
        "Overall File Bitrate: {:.2} Mbps",
        metadata.bitrate as f64 / 1_000_000.0
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "FRAME STATISTICS");
    let _ = writeln!(out, "Total Frames: {}", group_thousands(stats.frame_count));
    let _ = writeln!(out, "I-Frames: {}", group_thousands(stats.i_frame_count));
    let _ = write!(out, "I-Frame Interval: {:.1} frames", stats.i_frame_interval);
    out
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
