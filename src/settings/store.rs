//! Settings store.
//!
//! Owns the timer settings and the current mode, persists the settings as
//! pretty-printed JSON, and publishes the current mode's duration on a
//! `watch` channel that the countdown engine binds to.

use std::fs;
use std::path::{Path, PathBuf};

use tokio::sync::watch;
use tracing::debug;

use super::error::{Result, SettingsError};
use super::{PomodoroMode, SettingsUpdate, TimerSettings};

/// Directory under the platform config dir that holds the settings file.
const SETTINGS_DIR: &str = "pomodoro-countdown";

/// Settings file name.
const SETTINGS_FILE: &str = "settings.json";

/// Returns the default settings file path, if a config directory exists.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

/// Timer settings plus the currently selected mode.
#[derive(Debug)]
pub struct SettingsStore {
    settings: TimerSettings,
    mode: PomodoroMode,
    path: Option<PathBuf>,
    duration: watch::Sender<u32>,
}

impl SettingsStore {
    /// Creates a store that is not backed by a file.
    pub fn new(settings: TimerSettings) -> Self {
        let settings = settings.sanitized();
        let mode = PomodoroMode::default();
        let (duration, _) = watch::channel(settings.minutes_for(mode));
        Self {
            settings,
            mode,
            path: None,
            duration,
        }
    }

    /// Loads the store from `path`, falling back to defaults if the file is missing.
    ///
    /// Later changes made through `set_time_setting` and `reset` are written back.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
                path: path.clone(),
                source,
            })?;
            let settings: TimerSettings =
                serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "Loaded timer settings");
            settings
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            TimerSettings::default()
        };

        let mut store = Self::new(settings);
        store.path = Some(path);
        Ok(store)
    }

    /// Writes the settings to the backing file, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let io_error = |source| SettingsError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        // Serializing plain integers cannot fail.
        let json = serde_json::to_string_pretty(&self.settings).map_err(|source| {
            SettingsError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(path, json).map_err(io_error)?;

        debug!(path = %path.display(), "Saved timer settings");
        Ok(())
    }

    /// Returns the backing file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the current settings.
    pub fn settings(&self) -> TimerSettings {
        self.settings
    }

    /// Returns the duration configured for `mode`.
    pub fn time_setting(&self, mode: PomodoroMode) -> u32 {
        self.settings.minutes_for(mode)
    }

    /// Applies a partial update (with clamping) and persists it.
    pub fn set_time_setting(&mut self, update: SettingsUpdate) -> Result<()> {
        update.apply(&mut self.settings);
        self.publish();
        self.save()
    }

    /// Restores the default settings and persists them.
    pub fn reset(&mut self) -> Result<()> {
        self.settings = TimerSettings::default();
        self.publish();
        self.save()
    }

    pub fn current_mode(&self) -> PomodoroMode {
        self.mode
    }

    pub fn is_mode(&self, mode: PomodoroMode) -> bool {
        self.mode == mode
    }

    /// Selects the mode whose duration seeds the countdown.
    pub fn set_mode(&mut self, mode: PomodoroMode) {
        self.mode = mode;
        self.publish();
    }

    /// Returns a receiver of the current mode's duration in minutes.
    ///
    /// Receivers are notified only when the value actually changes.
    pub fn duration_source(&self) -> watch::Receiver<u32> {
        self.duration.subscribe()
    }

    fn publish(&self) {
        let minutes = self.settings.minutes_for(self.mode);
        self.duration.send_if_modified(|current| {
            if *current == minutes {
                return false;
            }
            *current = minutes;
            true
        });
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(TimerSettings::default())
    }
}
