//! Opens the configured companion files when a session starts.

use std::io;
use std::path::Path;

use tracing::{info, warn};

use crate::settings::AutorunEntry;

/// Open every enabled entry with the platform's default handler.
///
/// Returns how many entries were launched.
pub fn launch_enabled(entries: &[AutorunEntry]) -> usize {
    launch_with(entries, |path| open::that(path))
}

/// Launch entries through `opener`, skipping disabled, empty and missing paths.
///
/// A failing entry is logged and does not stop the remaining ones.
pub fn launch_with<F>(entries: &[AutorunEntry], mut opener: F) -> usize
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut launched = 0;
    for entry in entries.iter().filter(|e| e.enabled && !e.path.is_empty()) {
        let path = Path::new(&entry.path);
        if !path.exists() {
            warn!(path = %path.display(), "autorun file does not exist");
            continue;
        }
        match opener(path) {
            Ok(()) => {
                info!(path = %path.display(), "launched autorun file");
                launched += 1;
            }
            Err(err) => warn!(path = %path.display(), "failed to launch autorun file: {err}"),
        }
    }
    launched
}
