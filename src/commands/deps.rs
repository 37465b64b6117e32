//! External tool checks

use log::debug;

use crate::config::AnalyzerConfig;
use crate::media::FfprobeProbe;
use crate::media::check_command;
use crate::types::DependenciesResult;

/// Check that the configured ffprobe can be invoked.
pub fn check_dependencies(config: &AnalyzerConfig) -> DependenciesResult {
    let probe = FfprobeProbe::from_config(config);
    let ffprobe = check_command("ffprobe", probe.program(), &["-version"]);
    debug!(
        "Dependency check: ffprobe at {} installed={}",
        probe.program().display(),
        ffprobe.installed
    );

    DependenciesResult {
        all_installed: ffprobe.installed,
        dependencies: vec![ffprobe],
        platform: std::env::consts::OS.to_string(),
    }
}
