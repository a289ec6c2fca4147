//! Audio cues played as the slideshow moves on.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use crate::slideshow::Advance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// A new image is on screen.
    Next,
    /// The last image has been shown.
    End,
}

impl Cue {
    pub fn file_name(self) -> &'static str {
        match self {
            Cue::Next => "next.mp3",
            Cue::End => "end.mp3",
        }
    }

    pub fn for_advance(step: Advance) -> Option<Cue> {
        match step {
            Advance::Shown(_) => Some(Cue::Next),
            Advance::Finished => Some(Cue::End),
            Advance::Unchanged => None,
        }
    }
}

/// Plays cue files found next to the executable. Missing files are skipped.
pub struct CuePlayer {
    sounds_dir: Option<PathBuf>,
    output: Option<(OutputStream, OutputStreamHandle)>,
    /// The cue currently playing; replacing it stops the previous one.
    current: Option<Sink>,
}

impl CuePlayer {
    pub fn new() -> Self {
        let sounds_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let output = match OutputStream::try_default() {
            Ok(output) => Some(output),
            Err(err) => {
                warn!("audio output unavailable, cues disabled: {err}");
                None
            }
        };
        Self {
            sounds_dir,
            output,
            current: None,
        }
    }

    #[cfg(test)]
    fn without_output(sounds_dir: &Path) -> Self {
        Self {
            sounds_dir: Some(sounds_dir.to_path_buf()),
            output: None,
            current: None,
        }
    }

    /// Location of the cue file, if it exists.
    pub fn cue_path(&self, cue: Cue) -> Option<PathBuf> {
        let path = self.sounds_dir.as_ref()?.join(cue.file_name());
        path.is_file().then_some(path)
    }

    pub fn play(&mut self, cue: Cue) {
        let Some(path) = self.cue_path(cue) else {
            debug!(cue = cue.file_name(), "cue file not found, skipping");
            return;
        };
        let Some((_, handle)) = &self.output else {
            return;
        };
        match start_playback(handle, &path) {
            Ok(sink) => self.current = Some(sink),
            Err(err) => warn!("error playing sound: {err:#}"),
        }
    }

    /// Play the cue matching a slideshow transition.
    pub fn play_for(&mut self, step: Advance) {
        if let Some(cue) = Cue::for_advance(step) {
            self.play(cue);
        }
    }
}

fn start_playback(handle: &OutputStreamHandle, path: &Path) -> Result<Sink> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("failed to decode {}", path.display()))?;
    let sink = Sink::try_new(handle)?;
    sink.append(source);
    Ok(sink)
}
