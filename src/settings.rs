//! Persistence model and configuration IO.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// File name used under the per-user config directory.
const SETTINGS_FILE: &str = "settings.json";

/// Number of autorun slots shown in the settings view.
pub const AUTORUN_SLOTS: usize = 5;

const DEFAULT_DISPLAY_SECS: u32 = 60;
const DEFAULT_IMAGE_COUNT: u32 = 10;

/// A companion file opened when a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutorunEntry {
    /// File to open; empty means the slot is unused.
    pub path: String,
    pub enabled: bool,
}

impl Default for AutorunEntry {
    fn default() -> Self {
        Self {
            path: String::new(),
            enabled: true,
        }
    }
}

/// Settings persisted to `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Image folder used for the last session.
    pub folder: String,
    /// Seconds each image stays on screen.
    pub display_secs: u32,
    /// How many images a session shows at most.
    pub image_count: u32,
    /// Index into the enumerated monitor list.
    pub monitor: usize,
    pub autoruns: [AutorunEntry; AUTORUN_SLOTS],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folder: String::new(),
            display_secs: DEFAULT_DISPLAY_SECS,
            image_count: DEFAULT_IMAGE_COUNT,
            monitor: 0,
            autoruns: Default::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults per field.
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %path.display(), "no settings loaded: {err}");
                return Self::default();
            }
        };
        let map = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!(path = %path.display(), "settings file is not a JSON object, using defaults");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), "failed to parse settings: {err}");
                return Self::default();
            }
        };
        let settings = Self::from_map(&map);
        info!(path = %path.display(), "loaded settings");
        settings
    }

    /// Persist every field to `path`, replacing prior content.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(&Value::Object(self.to_map()))?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), "saved settings");
        Ok(())
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        let mut autoruns: [AutorunEntry; AUTORUN_SLOTS] = Default::default();
        for (i, entry) in autoruns.iter_mut().enumerate() {
            if let Some(path) = field::<String>(map, &format!("autorun_path_{i}")) {
                entry.path = path;
            }
            if let Some(enabled) = field::<bool>(map, &format!("autorun_enabled_{i}")) {
                entry.enabled = enabled;
            }
        }
        Self {
            folder: field(map, "last_folder").unwrap_or(defaults.folder),
            display_secs: field::<u32>(map, "display_time")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.display_secs),
            image_count: field::<u32>(map, "image_count")
                .filter(|count| *count > 0)
                .unwrap_or(defaults.image_count),
            monitor: field(map, "last_monitor").unwrap_or(defaults.monitor),
            autoruns,
        }
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("last_folder".into(), Value::from(self.folder.clone()));
        map.insert("last_monitor".into(), Value::from(self.monitor));
        map.insert("display_time".into(), Value::from(self.display_secs));
        map.insert("image_count".into(), Value::from(self.image_count));
        for (i, entry) in self.autoruns.iter().enumerate() {
            map.insert(format!("autorun_path_{i}"), Value::from(entry.path.clone()));
            map.insert(format!("autorun_enabled_{i}"), Value::from(entry.enabled));
        }
        map
    }
}

/// Read one typed field, treating a wrong type as absent.
fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    let value = map.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(key, "ignoring malformed setting: {err}");
            None
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "quickpose", "quickpose")
        .ok_or_else(|| anyhow!("cannot determine config directory"))
}

/// Build the settings path and ensure the directory exists.
pub fn settings_path() -> Result<PathBuf> {
    let proj_dirs = project_dirs()?;
    let config_dir = proj_dirs.config_dir();
    fs::create_dir_all(config_dir)?;
    Ok(config_dir.join(SETTINGS_FILE))
}

/// Per-user folder for log files, created if needed.
pub fn logs_dir() -> Result<PathBuf> {
    let dir = project_dirs()?.data_local_dir().join("logs");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Load settings from the per-user config file, returning defaults when missing.
pub fn load() -> Settings {
    match settings_path() {
        Ok(path) => Settings::load_from(&path),
        Err(err) => {
            warn!("using default settings: {err}");
            Settings::default()
        }
    }
}

/// Persist settings to the per-user config file as pretty JSON.
pub fn save(settings: &Settings) -> Result<()> {
    let path = settings_path()?;
    settings.save_to(&path)
}
