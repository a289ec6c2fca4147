//! Display enumeration for placing the session window.

use anyhow::Result;
use tracing::debug;

use crate::error::SessionError;

/// One attached display, in virtual-screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

impl Monitor {
    pub fn label(&self) -> String {
        format!("Monitor {}: {}x{}", self.index + 1, self.width, self.height)
    }
}

/// Display bounds as reported by the platform: origin then size.
type DisplayRect = (i32, i32, u32, u32);

/// List the attached displays.
///
/// `fallback` is the size of the current display as reported by the window
/// toolkit; it is used only when the platform query finds nothing.
pub fn enumerate_monitors(fallback: Option<(f32, f32)>) -> Result<Vec<Monitor>> {
    with_fallback(from_rects(platform_displays()), fallback)
}

/// Pick the monitor at `index`, or the last one when the index is out of range.
pub fn select_monitor(monitors: &[Monitor], index: usize) -> Option<Monitor> {
    monitors.get(index.min(monitors.len().checked_sub(1)?)).copied()
}

/// Number the usable displays in platform order, dropping empty ones.
fn from_rects(rects: impl IntoIterator<Item = DisplayRect>) -> Vec<Monitor> {
    rects
        .into_iter()
        .filter(|&(_, _, width, height)| width > 0 && height > 0)
        .enumerate()
        .map(|(index, (x, y, width, height))| Monitor {
            index,
            width,
            height,
            x,
            y,
        })
        .collect()
}

fn with_fallback(mut monitors: Vec<Monitor>, fallback: Option<(f32, f32)>) -> Result<Vec<Monitor>> {
    if monitors.is_empty() {
        if let Some((width, height)) = fallback.filter(|(w, h)| *w > 0.0 && *h > 0.0) {
            monitors.push(Monitor {
                index: 0,
                width: width as u32,
                height: height as u32,
                x: 0,
                y: 0,
            });
        }
    }
    if monitors.is_empty() {
        return Err(SessionError::NoMonitors.into());
    }
    debug!(count = monitors.len(), "enumerated monitors");
    Ok(monitors)
}

#[cfg(windows)]
fn platform_displays() -> Vec<DisplayRect> {
    use windows::Win32::Foundation::{BOOL, LPARAM, RECT, TRUE};
    use windows::Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO,
    };

    unsafe extern "system" fn collect(
        hmonitor: HMONITOR,
        _hdc: HDC,
        _rect: *mut RECT,
        lparam: LPARAM,
    ) -> BOOL {
        let rects = unsafe { &mut *(lparam.0 as *mut Vec<RECT>) };
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if unsafe { GetMonitorInfoW(hmonitor, &mut info) }.as_bool() {
            rects.push(info.rcMonitor);
        }
        TRUE
    }

    let mut rects: Vec<RECT> = Vec::new();
    let ok = unsafe {
        EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(collect),
            LPARAM(&mut rects as *mut Vec<RECT> as isize),
        )
    };
    if !ok.as_bool() {
        tracing::warn!("EnumDisplayMonitors failed");
    }
    rects
        .into_iter()
        .map(|r| {
            (
                r.left,
                r.top,
                (r.right - r.left).max(0) as u32,
                (r.bottom - r.top).max(0) as u32,
            )
        })
        .collect()
}

#[cfg(not(windows))]
fn platform_displays() -> Vec<DisplayRect> {
    match xcap::Monitor::all() {
        Ok(monitors) => monitors
            .iter()
            .map(|m| {
                (
                    m.x().unwrap_or(0),
                    m.y().unwrap_or(0),
                    m.width().unwrap_or(0),
                    m.height().unwrap_or(0),
                )
            })
            .collect(),
        Err(err) => {
            tracing::warn!("failed to enumerate monitors: {err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(index: usize) -> Monitor {
        Monitor {
            index,
            width: 1920,
            height: 1080,
            x: 1920 * index as i32,
            y: 0,
        }
    }

    #[test]
    fn select_clamps_to_last_monitor() {
        let monitors = [monitor(0), monitor(1)];
        assert_eq!(select_monitor(&monitors, 1), Some(monitor(1)));
        assert_eq!(select_monitor(&monitors, 7), Some(monitor(1)));
        assert_eq!(select_monitor(&[], 0), None);
    }

    #[test]
    fn label_is_one_based() {
        assert_eq!(monitor(0).label(), "Monitor 1: 1920x1080");
    }

    #[test]
    fn displays_keep_their_origin() {
        let monitors = from_rects([(0, 0, 2560, 1440), (2560, -200, 1080, 1920)]);
        assert_eq!(monitors.len(), 2);
        let second = select_monitor(&monitors, 1).unwrap();
        assert_eq!((second.x, second.y), (2560, -200));
        assert_eq!((second.width, second.height), (1080, 1920));
        assert_eq!(second.label(), "Monitor 2: 1080x1920");
    }

    #[test]
    fn empty_displays_are_skipped_and_indices_stay_contiguous() {
        let monitors = from_rects([(0, 0, 0, 0), (100, 0, 1280, 1024), (-1920, 0, 1920, 1080)]);
        let indices: Vec<_> = monitors.iter().map(|m| m.index).collect();
        assert_eq!(indices, [0, 1]);
        assert_eq!(monitors[0].x, 100);
        assert_eq!(monitors[1].x, -1920);
    }

    #[test]
    fn platform_list_wins_over_fallback() {
        let monitors = with_fallback(vec![monitor(0), monitor(1)], Some((800.0, 600.0))).unwrap();
        assert_eq!(monitors, [monitor(0), monitor(1)]);
    }

    #[test]
    fn fallback_size_becomes_single_monitor() {
        let monitors = with_fallback(Vec::new(), Some((2560.0, 1440.0))).unwrap();
        assert_eq!(
            monitors,
            [Monitor {
                index: 0,
                width: 2560,
                height: 1440,
                x: 0,
                y: 0
            }]
        );
    }

    #[test]
    fn no_display_is_an_error() {
        let err = with_fallback(Vec::new(), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::NoMonitors)
        ));
    }
}
