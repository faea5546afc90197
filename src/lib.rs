//! Pomodoro Countdown Library
//!
//! This library provides a wall-clock anchored countdown timer for the
//! Pomodoro Technique. It includes:
//! - Countdown engine with start / pause / resume / stop controls
//! - Injectable clocks for deterministic tests
//! - Timer settings with per-mode durations and JSON persistence
//! - CLI command parsing, interactive session, and display utilities
//! - Core value types (status, remaining time, snapshots)

pub mod cli;
pub mod countdown;
pub mod settings;
pub mod types;

// Re-export commonly used types for convenience
pub use countdown::{
    Clock, Countdown, CountdownOutcome, CountdownTimer, SystemClock, TimerError, TimerEvent,
    TokioClock,
};
pub use settings::{PomodoroMode, SettingsError, SettingsStore, SettingsUpdate, TimerSettings};
pub use types::{TimeRemaining, TimerDuration, TimerSnapshot, TimerStatus};
