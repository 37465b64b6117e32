//! Locating and checking external tools
//!
//! This module handles:
//! - Finding the ffprobe binary (release builds don't always inherit PATH)
//! - Checking that a tool is invocable and reading its version line
//! - Platform-specific install hints for a missing tool

use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::types::DependencyStatus;

/// Get common search paths for finding executables
pub fn get_search_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();

    // Tools installed next to our own data directory take priority
    if let Some(data_dir) = dirs::data_local_dir() {
        paths.push(data_dir.join("bitrate-analyzer").join("bin"));
    }

    #[cfg(target_os = "windows")]
    {
        paths.extend([
            PathBuf::from(r"C:\Program Files\ffmpeg\bin"),
            PathBuf::from(r"C:\Program Files (x86)\ffmpeg\bin"),
            PathBuf::from(r"C:\ffmpeg\bin"),
        ]);

        if let Ok(program_data) = std::env::var("ProgramData") {
            paths.push(Path::new(&program_data).join("chocolatey").join("bin"));
        }
        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            paths.push(Path::new(&userprofile).join("scoop").join("shims"));
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        paths.extend([
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/usr/bin"),
            PathBuf::from("/bin"),
            PathBuf::from("/opt/homebrew/bin"), // macOS Apple Silicon Homebrew
            PathBuf::from("/opt/local/bin"),    // MacPorts
            PathBuf::from("/snap/bin"),
        ]);

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".local").join("bin"));
            paths.push(home.join("bin"));
            paths.push(home.join(".linuxbrew").join("bin"));
        }
    }

    if let Some(path_env) = std::env::var_os("PATH") {
        for p in std::env::split_paths(&path_env) {
            if !p.as_os_str().is_empty() && !paths.contains(&p) {
                paths.push(p);
            }
        }
    }

    paths
}

/// Find a command in the search paths
pub fn find_command(cmd: &str) -> Option<PathBuf> {
    let extensions: &[&str] = if cfg!(target_os = "windows") {
        &["", ".exe", ".cmd", ".bat"]
    } else {
        &[""]
    };

    for dir in get_search_paths() {
        for ext in extensions {
            let full_path = dir.join(format!("{}{}", cmd, ext));
            if full_path.is_file() {
                debug!("Found {} at {}", cmd, full_path.display());
                return Some(full_path);
            }
        }
    }
    None
}

/// Check if a command is invocable and get its version line
pub fn check_command(name: &str, program: &Path, version_args: &[&str]) -> DependencyStatus {
    match Command::new(program).args(version_args).output() {
        Ok(result) if result.status.success() => {
            let stdout = String::from_utf8_lossy(&result.stdout);
            let stderr = String::from_utf8_lossy(&result.stderr);
            let output_str = if stdout.is_empty() { stderr } else { stdout };
            let version = output_str.lines().next().map(|s| s.trim().to_string());
            DependencyStatus {
                name: name.to_string(),
                installed: true,
                version,
            }
        }
        Ok(result) => {
            debug!("{} -version exited with {}", program.display(), result.status);
            DependencyStatus {
                name: name.to_string(),
                installed: false,
                version: None,
            }
        }
        Err(e) => {
            debug!("Failed to invoke {}: {}", program.display(), e);
            DependencyStatus {
                name: name.to_string(),
                installed: false,
                version: None,
            }
        }
    }
}

/// How to get ffprobe on the current platform
pub fn install_hint() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "windows") {
        "Install with: winget install ffmpeg (or choco install ffmpeg)"
    } else {
        "Install the ffmpeg package with your distribution's package manager, e.g. sudo apt install ffmpeg"
    }
}
