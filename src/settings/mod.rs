//! Timer settings for the Pomodoro Timer.
//!
//! This module provides:
//! - `TimerSettings`: per-mode durations and the long break interval
//! - `PomodoroMode`: the three timer modes
//! - `SettingsUpdate`: partial updates with range clamping
//! - `SettingsStore`: current mode, JSON persistence, and the duration source
//!   consumed by the countdown engine

pub mod error;
pub mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::MAX_TIMER_MINUTES;

pub use error::SettingsError;
pub use store::{default_settings_path, SettingsStore};

// ============================================================================
// PomodoroMode
// ============================================================================

/// Timer mode selecting which duration seeds the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PomodoroMode {
    /// Focused work session
    #[default]
    Pomodoro,
    /// Short break between pomodoros
    ShortBreak,
    /// Long break after every `long_break_interval` pomodoros
    LongBreak,
}

impl PomodoroMode {
    /// All modes in display order.
    pub const ALL: [PomodoroMode; 3] = [
        PomodoroMode::Pomodoro,
        PomodoroMode::ShortBreak,
        PomodoroMode::LongBreak,
    ];

    /// Returns the settings key of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            PomodoroMode::Pomodoro => "pomodoro",
            PomodoroMode::ShortBreak => "shortBreak",
            PomodoroMode::LongBreak => "longBreak",
        }
    }

    /// Returns the user-facing label of the mode.
    pub fn label(&self) -> &'static str {
        match self {
            PomodoroMode::Pomodoro => "ポモドーロ",
            PomodoroMode::ShortBreak => "短い休憩",
            PomodoroMode::LongBreak => "長い休憩",
        }
    }

    /// Returns true for either break mode.
    pub fn is_break(&self) -> bool {
        !matches!(self, PomodoroMode::Pomodoro)
    }
}

impl fmt::Display for PomodoroMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PomodoroMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "pomodoro" | "work" => Ok(PomodoroMode::Pomodoro),
            "shortbreak" | "short" => Ok(PomodoroMode::ShortBreak),
            "longbreak" | "long" => Ok(PomodoroMode::LongBreak),
            _ => Err(format!(
                "不明なモードです: '{}'（pomodoro, short-break, long-break のいずれか）",
                s
            )),
        }
    }
}

// ============================================================================
// TimerSettings
// ============================================================================

/// Durations in minutes for each mode, plus the long break interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    /// Work duration in minutes (0-60)
    pub pomodoro: u32,
    /// Short break duration in minutes (0-60)
    pub short_break: u32,
    /// Long break duration in minutes (0-60)
    pub long_break: u32,
    /// Pomodoros between long breaks (1-60)
    pub long_break_interval: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            pomodoro: 25,
            short_break: 5,
            long_break: 15,
            long_break_interval: 4,
        }
    }
}

impl TimerSettings {
    /// Returns the duration configured for `mode`.
    pub fn minutes_for(&self, mode: PomodoroMode) -> u32 {
        match mode {
            PomodoroMode::Pomodoro => self.pomodoro,
            PomodoroMode::ShortBreak => self.short_break,
            PomodoroMode::LongBreak => self.long_break,
        }
    }

    /// Returns the mode that follows a finished `current` session.
    ///
    /// `completed_pomodoros` includes the session that just finished.
    pub fn next_mode(&self, current: PomodoroMode, completed_pomodoros: u32) -> PomodoroMode {
        match current {
            PomodoroMode::Pomodoro => {
                let interval = self.long_break_interval.max(1);
                if completed_pomodoros > 0 && completed_pomodoros % interval == 0 {
                    PomodoroMode::LongBreak
                } else {
                    PomodoroMode::ShortBreak
                }
            }
            PomodoroMode::ShortBreak | PomodoroMode::LongBreak => PomodoroMode::Pomodoro,
        }
    }

    /// Returns a copy with every value forced into its accepted range.
    pub fn sanitized(self) -> Self {
        let mut settings = self;
        SettingsUpdate::from(self).apply(&mut settings);
        settings
    }
}

// ============================================================================
// SettingsUpdate
// ============================================================================

/// Partial settings update. Missing fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pomodoro: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_break: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_interval: Option<i64>,
}

impl SettingsUpdate {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Writes the set fields into `settings`.
    ///
    /// Mode durations are clamped to 0-60 and the interval to 1-60.
    pub fn apply(&self, settings: &mut TimerSettings) {
        if let Some(minutes) = self.pomodoro {
            settings.pomodoro = clamp_minutes(minutes, 0);
        }
        if let Some(minutes) = self.short_break {
            settings.short_break = clamp_minutes(minutes, 0);
        }
        if let Some(minutes) = self.long_break {
            settings.long_break = clamp_minutes(minutes, 0);
        }
        if let Some(interval) = self.long_break_interval {
            settings.long_break_interval = clamp_minutes(interval, 1);
        }
    }
}

impl From<TimerSettings> for SettingsUpdate {
    fn from(settings: TimerSettings) -> Self {
        Self {
            pomodoro: Some(i64::from(settings.pomodoro)),
            short_break: Some(i64::from(settings.short_break)),
            long_break: Some(i64::from(settings.long_break)),
            long_break_interval: Some(i64::from(settings.long_break_interval)),
        }
    }
}

fn clamp_minutes(value: i64, min: u32) -> u32 {
    value.clamp(i64::from(min), i64::from(MAX_TIMER_MINUTES)) as u32
}

// ============================================================================
// Tests
// ============================================================================
