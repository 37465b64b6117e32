//! Error type for bitrate analysis
//!
//! Every fallible operation in the crate returns `Result<T, AnalysisError>`.
//! A zero-frame video is not an error: the pipeline produces empty series
//! and no statistics instead.

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalysisError {
    /// The probing tool could not be invoked at all.
    #[error("{tool} not found. {hint}")]
    ProbeToolUnavailable {
        /// Name of the missing tool.
        tool: String,
        /// Platform-specific install instructions.
        hint: String,
    },

    /// The probing tool ran but exited unsuccessfully or timed out.
    #[error("ffprobe {query} query failed: {reason}")]
    ProbeFailed {
        /// Which query was running ("metadata" or "frames").
        query: &'static str,
        reason: String,
    },

    /// Metadata output was malformed or had no video stream.
    #[error("Failed to parse video metadata: {0}")]
    MetadataParseError(String),

    /// Frame output was malformed.
    #[error("Failed to parse frame data: {0}")]
    FrameParseError(String),

    /// A caller broke a contract, e.g. a non-positive frame rate reached the
    /// series builder.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Another analysis is still in flight.
    #[error("Analysis already in progress for {} (job {job_id})", path.display())]
    Busy { job_id: String, path: PathBuf },

    /// The in-flight analysis was cancelled before it finished.
    #[error("Analysis cancelled")]
    Cancelled,

    /// The analysis worker stopped without reporting an outcome.
    #[error("Analysis worker stopped unexpectedly: {0}")]
    Worker(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Whether this error aborts an analysis run, as opposed to a rejected
    /// or cancelled request.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AnalysisError::Busy { .. } | AnalysisError::Cancelled)
    }
}
