//! Running ffprobe
//!
//! [`MediaProbe`] is the seam between the analysis pipeline and the external
//! probing tool. [`FfprobeProbe`] is the real implementation: it spawns
//! ffprobe, drains stdout/stderr on separate threads so a large frame dump
//! can't fill the pipe and block the child, and kills the child on timeout.

use log::{debug, error, info};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::tools::{check_command, find_command, install_hint};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;

/// Source of raw probe output for a media file.
///
/// Both queries return the tool's JSON output verbatim; parsing happens in
/// [`crate::media::parse_metadata`] and [`crate::media::parse_frames`].
pub trait MediaProbe: Send + Sync {
    /// Fail with `ProbeToolUnavailable` if the tool can't be invoked.
    fn ensure_available(&self) -> Result<(), AnalysisError>;

    /// Container and stream metadata as JSON.
    fn metadata_json(&self, path: &Path) -> Result<String, AnalysisError>;

    /// Per-frame entries of the first video stream as JSON.
    fn frames_json(&self, path: &Path) -> Result<String, AnalysisError>;
}

/// [`MediaProbe`] backed by the ffprobe binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: PathBuf,
    timeout: Duration,
}

impl FfprobeProbe {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// Resolve the ffprobe binary from config, then the search paths, then
    /// plain `ffprobe` on PATH.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let program = config
            .ffprobe_path
            .clone()
            .or_else(|| find_command("ffprobe"))
            .unwrap_or_else(|| PathBuf::from("ffprobe"));
        debug!("Using ffprobe command: {}", program.display());
        Self::new(program, Duration::from_secs(config.probe_timeout_secs))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn unavailable(&self) -> AnalysisError {
        AnalysisError::ProbeToolUnavailable {
            tool: "FFprobe".to_string(),
            hint: install_hint().to_string(),
        }
    }

    fn run(&self, query: &'static str, args: &[&str], path: &Path) -> Result<String, AnalysisError> {
        info!("ffprobe {} query: file={}", query, path.display());
        let start = Instant::now();

        let mut child = Command::new(&self.program)
            .args(args)
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => self.unavailable(),
                _ => AnalysisError::ProbeFailed {
                    query,
                    reason: format!("failed to spawn ffprobe: {}", e),
                },
            })?;

        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();

        let stdout_thread = thread::spawn(move || {
            let mut stdout = Vec::new();
            if let Some(mut out) = stdout_handle {
                out.read_to_end(&mut stdout).ok();
            }
            stdout
        });

        let stderr_thread = thread::spawn(move || {
            let mut stderr = Vec::new();
            if let Some(mut err) = stderr_handle {
                err.read_to_end(&mut stderr).ok();
            }
            stderr
        });

        let status = loop {
            if start.elapsed() > self.timeout {
                error!(
                    "ffprobe {} query timed out after {} seconds for {}",
                    query,
                    self.timeout.as_secs(),
                    path.display()
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(AnalysisError::ProbeFailed {
                    query,
                    reason: format!("timed out after {} seconds", self.timeout.as_secs()),
                });
            }

            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(Duration::from_millis(50)),
                Err(e) => {
                    let _ = child.kill();
                    return Err(AnalysisError::ProbeFailed {
                        query,
                        reason: format!("failed to wait for ffprobe: {}", e),
                    });
                }
            }
        };

        let join_failed = |stream: &str| AnalysisError::ProbeFailed {
            query,
            reason: format!("failed to collect ffprobe {}", stream),
        };
        let stdout = stdout_thread.join().map_err(|_| join_failed("stdout"))?;
        let stderr = stderr_thread.join().map_err(|_| join_failed("stderr"))?;

        if !status.success() {
            let err_msg = String::from_utf8_lossy(&stderr).trim().to_string();
            error!("ffprobe {} query failed for {}: {}", query, path.display(), err_msg);
            let reason = if err_msg.is_empty() {
                format!("exited with {}", status)
            } else {
                err_msg
            };
            return Err(AnalysisError::ProbeFailed { query, reason });
        }

        debug!(
            "ffprobe {} query completed in {:.2}s ({} bytes)",
            query,
            start.elapsed().as_secs_f64(),
            stdout.len()
        );

        String::from_utf8(stdout).map_err(|e| AnalysisError::ProbeFailed {
            query,
            reason: format!("invalid UTF-8 output: {}", e),
        })
    }
}

impl MediaProbe for FfprobeProbe {
    fn ensure_available(&self) -> Result<(), AnalysisError> {
        let status = check_command("ffprobe", &self.program, &["-version"]);
        if !status.installed {
            error!("ffprobe is not invocable at {}", self.program.display());
            return Err(self.unavailable());
        }
        debug!(
            "ffprobe available: {}",
            status.version.as_deref().unwrap_or("unknown version")
        );
        Ok(())
    }

    fn metadata_json(&self, path: &Path) -> Result<String, AnalysisError> {
        self.run(
            "metadata",
            &[
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ],
            path,
        )
    }

    fn frames_json(&self, path: &Path) -> Result<String, AnalysisError> {
        self.run(
            "frames",
            &[
                "-v",
                "quiet",
                "-select_streams",
                "v:0",
                "-show_entries",
                // Newer ffprobe builds dropped pkt_pts_time, so ask for the
                // other timestamp fields as well
                "frame=pkt_pts_time,pts_time,best_effort_timestamp_time,pkt_size,pict_type",
                "-print_format",
                "json",
            ],
            path,
        )
    }
}
