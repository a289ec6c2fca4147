//! Image discovery, decoding and fit-to-window sizing.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui;
use tracing::warn;
use walkdir::WalkDir;

/// Smallest area an image is laid out in, even when the window reports less.
pub const MIN_AREA: (f32, f32) = (400.0, 300.0);

/// Collect the supported images directly inside `folder`, sorted by name.
pub fn collect_images(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in WalkDir::new(folder)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
    {
        let entry = match entry {
            Ok(entry) => entry,
            // The folder itself is unreadable.
            Err(err) if err.depth() == 0 => {
                return Err(err).with_context(|| format!("failed to list {}", folder.display()));
            }
            Err(err) => {
                warn!("skipping entry in {}: {err}", folder.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if is_supported_image(entry.path()) {
            images.push(entry.path().to_path_buf());
        }
    }
    images.sort();
    Ok(images)
}

/// Return true when the file extension is a supported image type.
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(OsStr::to_str) {
        Some(ext) => matches!(
            ext.to_ascii_lowercase().as_str(),
            "png" | "jpg" | "jpeg" | "gif" | "bmp"
        ),
        None => false,
    }
}

/// Decode an image file into pixels egui can upload as a texture.
pub fn load_color_image(path: &Path) -> Result<egui::ColorImage> {
    let img = image::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        size,
        rgba.as_flat_samples().as_slice(),
    ))
}

/// Largest size with the image's aspect ratio that fits inside `available`.
///
/// The available area is clamped to [`MIN_AREA`] and the result is truncated
/// to whole pixels.
pub fn fit_size(image: (f32, f32), available: (f32, f32)) -> (f32, f32) {
    let (img_w, img_h) = (f64::from(image.0), f64::from(image.1));
    if img_w <= 0.0 || img_h <= 0.0 {
        return (0.0, 0.0);
    }
    let avail_w = f64::from(available.0.max(MIN_AREA.0));
    let avail_h = f64::from(available.1.max(MIN_AREA.1));
    // Compare avail_w / img_w against avail_h / img_h without dividing first.
    let (w, h) = if avail_w * img_h <= avail_h * img_w {
        (avail_w, img_h * avail_w / img_w)
    } else {
        (img_w * avail_h / img_h, avail_h)
    };
    (w.floor() as f32, h.floor() as f32)
}
