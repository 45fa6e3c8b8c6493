//! Utility functions for error handling
//!
//! Preflight checks that turn bare `io::Error`s into `Load` errors carrying
//! the source name and the reason the path was needed.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{PanelError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `source_name` - Which source loader needs the file (for error context)
///
/// # Returns
/// * `Result<fs::File>` - The opened file or a detailed `Load` error
pub fn safe_open_file(path: &Path, source_name: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(PanelError::load(
            source_name,
            format!("file not found: {}", path.display()),
        ));
    }

    if !path.is_file() {
        return Err(PanelError::load(
            source_name,
            format!("path is not a file: {}", path.display()),
        ));
    }

    match fs::File::open(path) {
        Ok(file) => Ok(file),
        Err(e) => {
            let reason = match e.kind() {
                io::ErrorKind::PermissionDenied => "permission denied",
                io::ErrorKind::NotFound => "file disappeared during the run",
                _ => "failed to open file",
            };
            Err(PanelError::load(
                source_name,
                format!("{reason}: {} ({e})", path.display()),
            ))
        }
    }
}

/// Check that a directory exists and is readable, with rich error information
pub fn validate_directory(path: &Path, source_name: &str) -> Result<()> {
    if !path.exists() {
        return Err(PanelError::load(
            source_name,
            format!("directory not found: {}", path.display()),
        ));
    }

    if !path.is_dir() {
        return Err(PanelError::load(
            source_name,
            format!("path is not a directory: {}", path.display()),
        ));
    }

    match fs::read_dir(path) {
        Ok(_) => Ok(()),
        Err(e) => Err(PanelError::load(
            source_name,
            format!("failed to read directory {} ({e})", path.display()),
        )),
    }
}
