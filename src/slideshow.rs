//! Slideshow session: image selection, countdown and archiving.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use tracing::{info, warn};

use crate::archive::move_to_used;
use crate::error::SessionError;
use crate::image_ops::collect_images;
use crate::timer::CountdownTimer;

/// Navigation requested by the user or by the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// What a transition did to the slideshow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The image at this index is now shown.
    Shown(usize),
    /// The last image was left and the session is over.
    Finished,
    /// Nothing changed.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Paused,
    Finished,
}

/// One run through a shuffled subset of a folder.
#[derive(Debug)]
pub struct Session {
    folder: PathBuf,
    sequence: Vec<PathBuf>,
    /// Destination of each image once it has been moved to `used/`.
    archived: Vec<Option<PathBuf>>,
    index: usize,
    per_image_secs: u32,
    remaining_secs: u32,
    paused: bool,
    finished: bool,
    timer: CountdownTimer,
}

impl Session {
    /// Select up to `count` random images from `folder` and start the countdown.
    pub fn start(folder: &Path, count: u32, per_image_secs: u32, now: Instant) -> Result<Self> {
        let mut rng = ChaChaRng::from_entropy();
        Self::start_with_rng(folder, count, per_image_secs, now, &mut rng)
    }

    pub fn start_with_rng<R: Rng>(
        folder: &Path,
        count: u32,
        per_image_secs: u32,
        now: Instant,
        rng: &mut R,
    ) -> Result<Self> {
        if !folder.is_dir() {
            return Err(SessionError::InvalidFolder(folder.to_path_buf()).into());
        }
        let mut images = collect_images(folder)?;
        if images.is_empty() {
            return Err(SessionError::EmptyFolder(folder.to_path_buf()).into());
        }
        images.shuffle(rng);
        images.truncate(count.max(1) as usize);
        let per_image_secs = per_image_secs.max(1);
        info!(
            folder = %folder.display(),
            images = images.len(),
            per_image_secs,
            "session started"
        );

        let mut timer = CountdownTimer::default();
        timer.schedule(now);
        Ok(Self {
            folder: folder.to_path_buf(),
            archived: vec![None; images.len()],
            sequence: images,
            index: 0,
            per_image_secs,
            remaining_secs: per_image_secs,
            paused: false,
            finished: false,
            timer,
        })
    }

    /// Move forward or back one image.
    ///
    /// Leaving an image forward archives it; leaving the last one finishes the
    /// session. Going back never archives.
    pub fn advance(&mut self, direction: Direction, now: Instant) -> Advance {
        if self.finished {
            return Advance::Unchanged;
        }
        match direction {
            Direction::Prev => {
                if self.index == 0 {
                    return Advance::Unchanged;
                }
                self.index -= 1;
            }
            Direction::Next => {
                self.archive(self.index);
                if self.index + 1 >= self.sequence.len() {
                    self.finished = true;
                    self.timer.cancel();
                    info!(folder = %self.folder.display(), "session finished");
                    return Advance::Finished;
                }
                self.index += 1;
            }
        }
        self.restart_countdown(now);
        Advance::Shown(self.index)
    }

    /// Count down one second; reaching zero advances like a manual next.
    pub fn tick(&mut self, now: Instant) -> Option<Advance> {
        if self.paused || self.finished {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.advance(Direction::Next, now));
        }
        self.timer.schedule(now);
        None
    }

    /// Run the pending tick if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Advance> {
        if self.timer.fire(now) {
            self.tick(now)
        } else {
            None
        }
    }

    pub fn toggle_pause(&mut self, now: Instant) {
        if self.finished {
            return;
        }
        self.paused = !self.paused;
        if self.paused {
            self.timer.cancel();
        } else {
            self.timer.schedule(now);
        }
    }

    pub fn state(&self) -> SessionState {
        if self.finished {
            SessionState::Finished
        } else if self.paused {
            SessionState::Paused
        } else {
            SessionState::Running
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[cfg(test)]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[cfg(test)]
    pub fn sequence(&self) -> &[PathBuf] {
        &self.sequence
    }

    #[cfg(test)]
    pub fn has_pending_tick(&self) -> bool {
        self.timer.is_pending()
    }

    /// Time until the next tick, used to schedule repaints.
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.timer.remaining(now)
    }

    /// Where the current image lives, following it into `used/` if archived.
    pub fn current_path(&self) -> &Path {
        self.archived[self.index]
            .as_deref()
            .unwrap_or(&self.sequence[self.index])
    }

    pub fn progress_label(&self) -> String {
        format!("Image {}/{}", self.index + 1, self.sequence.len())
    }

    pub fn countdown_label(&self) -> String {
        format!("{}s", self.remaining_secs)
    }

    fn restart_countdown(&mut self, now: Instant) {
        self.remaining_secs = self.per_image_secs;
        self.timer.cancel();
        if !self.paused {
            self.timer.schedule(now);
        }
    }

    fn archive(&mut self, index: usize) {
        if self.archived[index].is_some() {
            return;
        }
        match move_to_used(&self.sequence[index]) {
            Ok(Some(dest)) => self.archived[index] = Some(dest),
            Ok(None) => {}
            Err(err) => warn!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    use crate::archive::USED_DIR;
    use crate::timer::TICK;

    fn folder_with(count: usize) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..count {
            fs::write(dir.path().join(format!("pose{i:02}.png")), b"x").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        dir
    }

    fn start(dir: &Path, count: u32, secs: u32, now: Instant) -> Session {
        let mut rng = ChaChaRng::seed_from_u64(7);
        Session::start_with_rng(dir, count, secs, now, &mut rng).unwrap()
    }

    fn used(dir: &Path, file: &Path) -> PathBuf {
        dir.join(USED_DIR).join(file.file_name().unwrap())
    }

    #[test]
    fn sequence_length_is_min_of_request_and_available() {
        let dir = folder_with(6);
        let now = Instant::now();
        for (requested, expected) in [(1, 1), (4, 4), (6, 6), (20, 6)] {
            let session = start(dir.path(), requested, 30, now);
            assert_eq!(session.len(), expected);
            let unique: HashSet<_> = session.sequence().iter().collect();
            assert_eq!(unique.len(), expected);
            assert_eq!(session.index(), 0);
            assert_eq!(session.remaining_secs(), 30);
            assert_eq!(session.state(), SessionState::Running);
            assert!(session.has_pending_tick());
        }
    }

    #[test]
    fn empty_folder_is_rejected() {
        let dir = folder_with(0);
        let err = Session::start(dir.path(), 5, 30, Instant::now()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::EmptyFolder(_))
        ));
    }

    #[test]
    fn missing_folder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::start(&dir.path().join("nope"), 5, 30, Instant::now()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::InvalidFolder(_))
        ));
    }

    #[test]
    fn prev_at_start_is_a_no_op() {
        let dir = folder_with(3);
        let now = Instant::now();
        let mut session = start(dir.path(), 3, 30, now);
        assert_eq!(session.advance(Direction::Prev, now), Advance::Unchanged);
        assert_eq!(session.index(), 0);
        assert!(!dir.path().join(USED_DIR).exists());
    }

    #[test]
    fn next_archives_the_image_being_left() {
        let dir = folder_with(3);
        let now = Instant::now();
        let mut session = start(dir.path(), 3, 30, now);
        let first = session.sequence()[0].clone();

        session.tick(now + TICK);
        assert_eq!(session.remaining_secs(), 29);
        assert_eq!(session.advance(Direction::Next, now), Advance::Shown(1));
        assert_eq!(session.remaining_secs(), 30);
        assert!(!first.exists());
        assert!(used(dir.path(), &first).exists());
        assert!(session.sequence()[1].exists());
    }

    #[test]
    fn prev_shows_archived_image_from_used_folder() {
        let dir = folder_with(3);
        let now = Instant::now();
        let mut session = start(dir.path(), 3, 30, now);
        let first = session.sequence()[0].clone();

        session.advance(Direction::Next, now);
        assert_eq!(session.advance(Direction::Prev, now), Advance::Shown(0));
        assert_eq!(session.current_path(), used(dir.path(), &first));

        // Leaving it again must not try to archive it a second time.
        assert_eq!(session.advance(Direction::Next, now), Advance::Shown(1));
        assert!(used(dir.path(), &first).exists());
    }

    #[test]
    fn next_on_last_image_finishes_and_archives_it() {
        let dir = folder_with(2);
        let now = Instant::now();
        let mut session = start(dir.path(), 2, 30, now);
        let last = session.sequence()[1].clone();

        session.advance(Direction::Next, now);
        assert!(last.exists());
        assert_eq!(session.advance(Direction::Next, now), Advance::Finished);
        assert_eq!(session.state(), SessionState::Finished);
        assert!(!last.exists());
        assert!(used(dir.path(), &last).exists());
        assert!(!session.has_pending_tick());

        // Finished is terminal.
        assert_eq!(session.advance(Direction::Prev, now), Advance::Unchanged);
        assert_eq!(session.tick(now), None);
        session.toggle_pause(now);
        assert_eq!(session.state(), SessionState::Finished);
    }

    #[test]
    fn countdown_expiry_matches_manual_next() {
        let dir_a = folder_with(3);
        let dir_b = folder_with(3);
        let now = Instant::now();
        let mut timed = start(dir_a.path(), 3, 3, now);
        let mut manual = start(dir_b.path(), 3, 3, now);

        assert_eq!(timed.tick(now), None);
        assert_eq!(timed.tick(now), None);
        let by_timer = timed.tick(now);
        let by_hand = manual.advance(Direction::Next, now);
        assert_eq!(by_timer, Some(by_hand));
        assert_eq!(timed.index(), manual.index());
        assert_eq!(timed.remaining_secs(), manual.remaining_secs());
        let left = timed.sequence()[0].file_name().unwrap().to_owned();
        assert!(dir_a.path().join(USED_DIR).join(&left).exists());
        assert!(dir_b.path().join(USED_DIR).join(&left).exists());
    }

    #[test]
    fn countdown_expiry_on_last_image_finishes() {
        let dir = folder_with(1);
        let now = Instant::now();
        let mut session = start(dir.path(), 1, 1, now);
        assert_eq!(session.poll(now + TICK), Some(Advance::Finished));
        assert_eq!(session.state(), SessionState::Finished);
    }

    #[test]
    fn poll_fires_only_after_deadline() {
        let dir = folder_with(2);
        let now = Instant::now();
        let mut session = start(dir.path(), 2, 10, now);
        assert_eq!(session.poll(now + Duration::from_millis(400)), None);
        assert_eq!(session.remaining_secs(), 10);
        assert_eq!(session.poll(now + TICK), None);
        assert_eq!(session.remaining_secs(), 9);
        // Same instant again: the tick was consumed and rescheduled.
        session.poll(now + TICK);
        assert_eq!(session.remaining_secs(), 9);
    }

    #[test]
    fn pause_and_resume_keep_remaining_and_one_pending_tick() {
        let dir = folder_with(2);
        let now = Instant::now();
        let mut session = start(dir.path(), 2, 10, now);
        session.poll(now + TICK);
        assert_eq!(session.remaining_secs(), 9);

        session.toggle_pause(now + TICK);
        assert_eq!(session.state(), SessionState::Paused);
        assert!(!session.has_pending_tick());
        assert_eq!(session.poll(now + TICK * 5), None);
        assert_eq!(session.tick(now + TICK * 5), None);
        assert_eq!(session.remaining_secs(), 9);

        let resumed = now + TICK * 6;
        session.toggle_pause(resumed);
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.remaining_secs(), 9);
        assert!(session.has_pending_tick());
        assert_eq!(session.time_until_tick(resumed), Some(TICK));
    }

    #[test]
    fn navigating_while_paused_does_not_schedule_ticks() {
        let dir = folder_with(3);
        let now = Instant::now();
        let mut session = start(dir.path(), 3, 10, now);
        session.toggle_pause(now);
        assert_eq!(session.advance(Direction::Next, now), Advance::Shown(1));
        assert_eq!(session.state(), SessionState::Paused);
        assert!(!session.has_pending_tick());
        assert_eq!(session.remaining_secs(), 10);
    }

    #[test]
    fn labels_follow_progress() {
        let dir = folder_with(4);
        let now = Instant::now();
        let mut session = start(dir.path(), 4, 45, now);
        assert_eq!(session.progress_label(), "Image 1/4");
        assert_eq!(session.countdown_label(), "45s");
        session.advance(Direction::Next, now);
        assert_eq!(session.progress_label(), "Image 2/4");
    }

    #[test]
    fn file_removed_externally_does_not_abort() {
        let dir = folder_with(2);
        let now = Instant::now();
        let mut session = start(dir.path(), 2, 10, now);
        fs::remove_file(&session.sequence()[0]).unwrap();
        assert_eq!(session.advance(Direction::Next, now), Advance::Shown(1));
    }

    #[test]
    fn zero_display_time_counts_down_from_one() {
        let dir = folder_with(2);
        let now = Instant::now();
        let mut session = start(dir.path(), 2, 0, now);
        assert_eq!(session.remaining_secs(), 1);
        assert_eq!(session.countdown_label(), "1s");
        assert_eq!(session.tick(now + TICK), Some(Advance::Shown(1)));
        assert_eq!(session.remaining_secs(), 1);
    }
}
