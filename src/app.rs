use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use eframe::egui::{self, Color32, Key, RichText};
use eframe::CreationContext;
use tracing::{debug, info, warn};

use crate::autorun;
use crate::error::SessionError;
use crate::image_ops::{fit_size, load_color_image};
use crate::monitor::{self, Monitor};
use crate::settings::{self, Settings};
use crate::slideshow::{Advance, Direction, Session, SessionState};
use crate::sound::{Cue, CuePlayer};

const STATUS_IDLE: &str = "Ready";
const STATUS_COMPLETE: &str = "All images have been displayed";
const STATUS_CANCELLED: &str = "Session cancelled";

pub struct QuickPoseApp {
    settings: Settings,
    monitors: Vec<Monitor>,
    status: String,
    session: Option<ActiveSession>,
    cues: CuePlayer,
}

/// A running slideshow plus what is needed to draw it.
struct ActiveSession {
    session: Session,
    monitor: Monitor,
    texture: Option<egui::TextureHandle>,
    /// Index the current texture was loaded for.
    loaded: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionAction {
    Next,
    Prev,
    TogglePause,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionOutcome {
    Continue,
    Finished,
    Cancelled,
}

impl QuickPoseApp {
    pub fn new(cc: &CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        Self {
            settings: settings::load(),
            monitors: Vec::new(),
            status: STATUS_IDLE.to_string(),
            session: None,
            cues: CuePlayer::new(),
        }
    }

    pub fn ui(&mut self, ctx: &egui::Context) {
        if self.monitors.is_empty() {
            self.refresh_monitors(ctx);
        }
        self.show_session(ctx);

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.heading(RichText::new("QuickPose - Gesture Timer").strong());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.timer_section(ui);
                ui.separator();
                self.monitor_section(ui);
                ui.separator();
                self.folder_section(ui);
                ui.separator();
                self.autorun_section(ui);
                ui.separator();

                let can_start = self.session.is_none();
                if ui
                    .add_enabled(can_start, egui::Button::new("Start Session"))
                    .clicked()
                {
                    match self.start_session(ctx) {
                        Ok(()) => self.status = "Session running".to_string(),
                        Err(err) => {
                            warn!("session not started: {err:#}");
                            self.status = err.to_string();
                        }
                    }
                }

                ui.separator();
                ui.label(format!("Status: {}", self.status));
            });
        });
    }

    fn timer_section(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Timer Settings").strong());
        egui::Grid::new("timer_grid").num_columns(2).show(ui, |ui| {
            ui.label("Seconds per image:");
            ui.add(egui::DragValue::new(&mut self.settings.display_secs).clamp_range(1..=999));
            ui.end_row();
            ui.label("Number of images:");
            ui.add(egui::DragValue::new(&mut self.settings.image_count).clamp_range(1..=999));
            ui.end_row();
        });
    }

    fn monitor_section(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Display Monitor").strong());
            if ui.small_button("⟳").on_hover_text("Refresh").clicked() {
                self.refresh_monitors(ui.ctx());
            }
        });
        if self.monitors.is_empty() {
            ui.label("No monitors detected");
        }
        for monitor in &self.monitors {
            ui.radio_value(&mut self.settings.monitor, monitor.index, monitor.label());
        }
    }

    fn folder_section(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Image Folder").strong());
        ui.horizontal(|ui| {
            if ui.button("Browse...").clicked() {
                let mut dialog = rfd::FileDialog::new();
                if !self.settings.folder.is_empty() {
                    dialog = dialog.set_directory(&self.settings.folder);
                }
                if let Some(path) = dialog.pick_folder() {
                    self.settings.folder = path.display().to_string();
                }
            }
            ui.label(path_text(&self.settings.folder));
        });
    }

    fn autorun_section(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Autoruns").strong());
        ui.label(
            "Use to run things on startup, like template files, timers, music players, etc.",
        );
        for (idx, entry) in self.settings.autoruns.iter_mut().enumerate() {
            ui.horizontal(|ui| {
                ui.checkbox(&mut entry.enabled, "");
                if ui.button("Browse...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_title("Select Autorun File")
                        .pick_file()
                    {
                        entry.path = path.display().to_string();
                    }
                }
                if !entry.path.is_empty() && ui.button("✕").clicked() {
                    entry.path.clear();
                }
                ui.label(path_text(&entry.path))
                    .on_hover_text(format!("Autorun {}", idx + 1));
            });
        }
    }

    fn refresh_monitors(&mut self, ctx: &egui::Context) {
        match monitor::enumerate_monitors(current_monitor_size(ctx)) {
            Ok(monitors) => self.monitors = monitors,
            Err(err) => {
                debug!("{err}");
                self.monitors.clear();
            }
        }
    }

    fn start_session(&mut self, ctx: &egui::Context) -> Result<()> {
        let folder = PathBuf::from(&self.settings.folder);
        if self.settings.folder.is_empty() || !folder.is_dir() {
            return Err(SessionError::InvalidFolder(folder).into());
        }

        self.monitors = monitor::enumerate_monitors(current_monitor_size(ctx))?;
        let target = monitor::select_monitor(&self.monitors, self.settings.monitor)
            .ok_or(SessionError::NoMonitors)?;

        let session = Session::start(
            &folder,
            self.settings.image_count,
            self.settings.display_secs,
            Instant::now(),
        )?;

        let launched = autorun::launch_enabled(&self.settings.autoruns);
        if launched > 0 {
            info!(launched, "autorun files opened");
        }

        if let Err(err) = settings::save(&self.settings) {
            warn!("failed to save settings: {err:#}");
        }

        info!(monitor = target.index, "opening session window");
        self.cues.play(Cue::Next);
        self.session = Some(ActiveSession {
            session,
            monitor: target,
            texture: None,
            loaded: None,
        });
        Ok(())
    }

    fn show_session(&mut self, ctx: &egui::Context) {
        let Some(active) = self.session.as_mut() else {
            return;
        };
        let cues = &mut self.cues;

        let builder = egui::ViewportBuilder::default()
            .with_title("QuickPose - Session")
            .with_position([active.monitor.x as f32, active.monitor.y as f32])
            .with_inner_size([800.0, 600.0])
            .with_min_inner_size([400.0, 300.0])
            .with_maximized(true);
        let outcome = ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("quickpose_session"),
            builder,
            |ctx, _class| active.ui(ctx, cues),
        );

        match outcome {
            SessionOutcome::Continue => {
                if let Some(wait) = active.session.time_until_tick(Instant::now()) {
                    ctx.request_repaint_after(wait);
                }
            }
            SessionOutcome::Finished => {
                self.session = None;
                self.status = STATUS_COMPLETE.to_string();
            }
            SessionOutcome::Cancelled => {
                info!("session cancelled");
                self.session = None;
                self.status = STATUS_CANCELLED.to_string();
            }
        }
    }
}

impl ActiveSession {
    fn ui(&mut self, ctx: &egui::Context, cues: &mut CuePlayer) -> SessionOutcome {
        if ctx.input(|i| i.viewport().close_requested()) {
            return SessionOutcome::Cancelled;
        }

        let now = Instant::now();
        if let Some(step) = self.session.poll(now) {
            cues.play_for(step);
            if step == Advance::Finished {
                return SessionOutcome::Finished;
            }
        }

        let mut action = ctx.input(|i| {
            if i.key_pressed(Key::Escape) {
                Some(SessionAction::Cancel)
            } else if i.key_pressed(Key::ArrowRight) {
                Some(SessionAction::Next)
            } else if i.key_pressed(Key::ArrowLeft) {
                Some(SessionAction::Prev)
            } else if i.key_pressed(Key::Space) {
                Some(SessionAction::TogglePause)
            } else {
                None
            }
        });

        egui::TopBottomPanel::bottom("session_controls")
            .exact_height(50.0)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(self.session.progress_label());
                    if ui.button("⏮ Previous").clicked() {
                        action = Some(SessionAction::Prev);
                    }
                    let pause_label = if self.session.state() == SessionState::Paused {
                        "▶ Resume"
                    } else {
                        "⏸ Pause"
                    };
                    if ui.button(pause_label).clicked() {
                        action = Some(SessionAction::TogglePause);
                    }
                    if ui.button("⏭ Next").clicked() {
                        action = Some(SessionAction::Next);
                    }
                    if ui.button("✕ End").clicked() {
                        action = Some(SessionAction::Cancel);
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(RichText::new(self.session.countdown_label()).monospace());
                    });
                });
            });

        match action {
            Some(SessionAction::Cancel) => return SessionOutcome::Cancelled,
            Some(SessionAction::TogglePause) => self.session.toggle_pause(now),
            Some(SessionAction::Next) => {
                let step = self.session.advance(Direction::Next, now);
                cues.play_for(step);
                if step == Advance::Finished {
                    return SessionOutcome::Finished;
                }
            }
            Some(SessionAction::Prev) => {
                cues.play_for(self.session.advance(Direction::Prev, now));
            }
            None => {}
        }

        self.ensure_texture(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                let available = ui.available_size();
                ui.centered_and_justified(|ui| match &self.texture {
                    Some(texture) => {
                        let native = texture.size_vec2();
                        let (w, h) = fit_size((native.x, native.y), (available.x, available.y));
                        ui.add(
                            egui::Image::from_texture(egui::load::SizedTexture::from_handle(
                                texture,
                            ))
                            .fit_to_exact_size(egui::vec2(w, h)),
                        );
                    }
                    None => {
                        ui.label(RichText::new("Image unavailable").color(Color32::GRAY));
                    }
                });
            });

        SessionOutcome::Continue
    }

    /// Load the texture for the current index if it is not already shown.
    fn ensure_texture(&mut self, ctx: &egui::Context) {
        let index = self.session.index();
        if self.loaded == Some(index) {
            return;
        }
        self.loaded = Some(index);
        let path = self.session.current_path();
        self.texture = match load_color_image(path) {
            Ok(image) => Some(ctx.load_texture("session_image", image, egui::TextureOptions::LINEAR)),
            Err(err) => {
                warn!("{err:#}");
                None
            }
        };
    }
}

impl eframe::App for QuickPoseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }
}

fn current_monitor_size(ctx: &egui::Context) -> Option<(f32, f32)> {
    ctx.input(|i| i.viewport().monitor_size)
        .map(|size| (size.x, size.y))
}

fn path_text(path: &str) -> String {
    if path.is_empty() {
        "(none)".to_string()
    } else {
        path.to_string()
    }
}
