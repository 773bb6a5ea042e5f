//! Utility functions for quaver.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref().to_path_buf();
    if !path.exists() {
        let _ = fs::create_dir_all(&path);
    }
    path
}

/// Move a file, falling back to copy+remove when rename cannot cross devices.
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent);
    }

    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            fs::copy(src, dst)?;
            fs::remove_file(src)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn is_cross_device_error(err: &io::Error) -> bool {
    // EXDEV on Unix-like systems (Linux/macOS).
    err.raw_os_error() == Some(18)
}

/// Get the quaver data directory (~/.quaver).
pub fn get_data_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_dir(home.join(".quaver"))
}

/// Get the media directory used for downloads and rendered pages.
///
/// If `media_dir` is provided, it is used (with `~` expansion).
/// Otherwise defaults to `~/.quaver/media`.
pub fn get_media_path(media_dir: Option<&str>) -> PathBuf {
    let path = match media_dir {
        Some(dir) => expand_tilde(dir),
        None => get_data_path().join("media"),
    };
    ensure_dir(path)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(rest)
    } else if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    } else {
        PathBuf::from(path)
    }
}
