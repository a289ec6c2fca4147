#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod archive;
mod autorun;
mod error;
mod image_ops;
mod monitor;
mod settings;
mod slideshow;
mod sound;
mod timer;

use eframe::egui;
use tracing_appender::non_blocking::WorkerGuard;

/// Log to stdout and to `quickpose.log` in the per-user data folder.
fn setup_logging() -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quickpose=debug"));

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true);

    let (file_layer, guard) = match settings::logs_dir() {
        Ok(dir) => {
            let file_appender = tracing_appender::rolling::never(dir, "quickpose.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_level(true);
            (Some(layer), Some(guard))
        }
        Err(err) => {
            eprintln!("file logging disabled: {err:#}");
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

fn main() -> anyhow::Result<()> {
    // Keep the guard alive so buffered log lines are flushed on exit.
    let _log_guard = setup_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting QuickPose");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("QuickPose - Gesture Timer")
            .with_inner_size([800.0, 600.0])
            .with_min_inner_size([500.0, 400.0]),
        ..Default::default()
    };
    eframe::run_native(
        "QuickPose",
        native_options,
        Box::new(|cc| Box::new(app::QuickPoseApp::new(cc))),
    )?;
    Ok(())
}
