//! Moves shown images into a `used` subfolder so later sessions skip them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

/// Name of the archive folder created next to the images.
pub const USED_DIR: &str = "used";

/// Move `path` into `<parent>/used/`, doing nothing if it is already gone.
///
/// Returns the destination when a move happened.
pub fn move_to_used(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        debug!(path = %path.display(), "already archived or missing");
        return Ok(None);
    }
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent folder", path.display()))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;
    let used_dir = parent.join(USED_DIR);
    fs::create_dir_all(&used_dir)
        .with_context(|| format!("failed to create {}", used_dir.display()))?;
    let dest = used_dir.join(file_name);
    move_file(path, &dest)
        .with_context(|| format!("failed to move {} to {}", path.display(), dest.display()))?;
    debug!(from = %path.display(), to = %dest.display(), "archived image");
    Ok(Some(dest))
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if needs_copy(&err) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(err) => Err(err),
    }
}

/// Rename cannot cross filesystems; only then copy and delete instead.
fn needs_copy(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices
}
