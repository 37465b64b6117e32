//! The `analyze` command
//!
//! Resolves configuration overrides, runs one analysis job to completion
//! while forwarding progress, and renders the outcome.

use log::{debug, info};
use std::path::PathBuf;

use crate::bitrate::{format_summary, ExportReport};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::jobs::{AnalysisEvent, AnalysisQueue};
use crate::types::{AnalysisProgress, AnalysisResult};

#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub file: PathBuf,
    /// `Some(None)` exports to the configured default location
    pub export: Option<Option<PathBuf>>,
    pub json: bool,
    pub ffprobe: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl AnalyzeRequest {
    /// Layer command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, mut config: AnalyzerConfig) -> Result<AnalyzerConfig, AnalysisError> {
        if let Some(ffprobe) = &self.ffprobe {
            config.ffprobe_path = Some(ffprobe.clone());
        }
        if let Some(timeout) = self.timeout_secs {
            config.probe_timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn export_path(&self, config: &AnalyzerConfig) -> Option<PathBuf> {
        self.export
            .as_ref()
            .map(|path| path.clone().unwrap_or_else(|| config.default_export_path()))
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.file.is_file() {
            return Err(AnalysisError::InvalidInput(format!(
                "File not found: {}",
                self.file.display()
            )));
        }
        Ok(())
    }
}

/// Start a job for `request.file` and drive it to its terminal event.
pub async fn run_analysis<F>(
    queue: &AnalysisQueue,
    request: &AnalyzeRequest,
    mut on_progress: F,
) -> Result<AnalysisResult, AnalysisError>
where
    F: FnMut(&AnalysisProgress),
{
    request.validate()?;
    let mut handle = queue.start(&request.file)?;
    debug!("Driving job {} for {}", handle.job_id(), handle.path().display());

    while let Some(event) = handle.next_event().await {
        match event {
            AnalysisEvent::Progress(progress) => on_progress(&progress),
            AnalysisEvent::Completed(result) => return Ok(*result),
            AnalysisEvent::Failed(e) => return Err(e),
        }
    }
    handle.wait().await
}

/// Text summary, or the export document when `json` is set.
pub fn render(result: &AnalysisResult, json: bool) -> Result<String, AnalysisError> {
    if json {
        ExportReport::from_result(result).to_json()
    } else {
        Ok(format_summary(result))
    }
}

/// Write the export document and return where it went.
pub fn export(result: &AnalysisResult, path: PathBuf) -> Result<PathBuf, AnalysisError> {
    ExportReport::from_result(result).write_to(&path)?;
    info!("Saved analysis export to {}", path.display());
    Ok(path)
}
