//! Conditions that block a session from starting.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please select a valid image folder")]
    InvalidFolder(PathBuf),
    #[error("No images found in {}", .0.display())]
    EmptyFolder(PathBuf),
    #[error("No monitors detected")]
    NoMonitors,
}
