//! Download tool discovery
//!
//! Search order:
//! 1. Next to our own executable (bundled/dev layout)
//! 2. System PATH
//! 3. Common installation paths (Homebrew, pip user installs, etc.)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default name of the external download tool
pub const TOOL_NAME: &str = "yt-dlp";

/// Find the download tool binary, trying bundled, PATH and common locations.
pub fn locate_tool(name: &str) -> Option<PathBuf> {
    if let Some(adjacent) = find_adjacent(name) {
        info!("using bundled {} at {}", name, adjacent.display());
        return Some(adjacent);
    }

    if let Ok(path) = which::which(name) {
        info!("using system {} at {}", name, path.display());
        return Some(path);
    }

    if let Some(common) = find_in_common_paths(name) {
        info!("using {} from common path {}", name, common.display());
        return Some(common);
    }

    warn!("{} not found anywhere", name);
    None
}

/// Platform-specific executable filename
pub fn exe_name(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Check next to the running executable (development and bundled layouts).
fn find_adjacent(name: &str) -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    let candidate = exe_dir.join(exe_name(name));
    debug!("checking adjacent path {}", candidate.display());
    if candidate.is_file() && is_executable(&candidate) {
        return Some(candidate);
    }

    // macOS bundle layout: App.app/Contents/MacOS/<bin>
    //                      App.app/Contents/Resources/bin/<tool>
    if exe_dir.ends_with("MacOS") {
        let contents = exe_dir.parent()?;
        let bundled = contents.join("Resources").join("bin").join(name);
        if bundled.is_file() && is_executable(&bundled) {
            return Some(bundled);
        }
    }

    None
}

/// Check well-known installation directories.
fn find_in_common_paths(name: &str) -> Option<PathBuf> {
    let common_dirs = [
        // macOS Homebrew (Apple Silicon)
        PathBuf::from("/opt/homebrew/bin"),
        // macOS Homebrew (Intel) and manual installs
        PathBuf::from("/usr/local/bin"),
        // System
        PathBuf::from("/usr/bin"),
    ];

    for dir in common_dirs {
        let candidate = dir.join(name);
        if candidate.is_file() && is_executable(&candidate) {
            return Some(candidate);
        }
    }

    // pip user install
    if let Some(home) = dirs::home_dir() {
        let candidate = home.join(".local").join("bin").join(name);
        if candidate.is_file() && is_executable(&candidate) {
            return Some(candidate);
        }
    }

    None
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        match std::fs::metadata(path) {
            Ok(metadata) => metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    {
        path.exists()
    }
}
