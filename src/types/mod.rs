//! Core data types for the countdown timer.
//!
//! This module defines the value types shared by the engine and its readers:
//! - Timer status
//! - Remaining time with `MM:SS` formatting
//! - Validated durations
//! - Immutable snapshots of the observable state

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Milliseconds in one second (also the tick period).
pub const SECOND_IN_MILLISECONDS: i64 = 1000;

/// Seconds in one minute.
pub const SECONDS_PER_MINUTE: i64 = 60;

/// Largest accepted duration in minutes.
pub const MAX_TIMER_MINUTES: u32 = 60;

/// Converts a (possibly fractional) number of minutes into milliseconds.
pub fn minutes_to_milliseconds(minutes: f64) -> i64 {
    (minutes * (SECONDS_PER_MINUTE * SECOND_IN_MILLISECONDS) as f64).round() as i64
}

// ============================================================================
// TimerStatus
// ============================================================================

/// Represents the current status of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// Counting down
    Running,
    /// Frozen at the current remaining time
    Paused,
    /// Idle, showing the nominal duration
    #[default]
    Stopped,
    /// The deadline was reached
    Finished,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Stopped => "stopped",
            TimerStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TimeRemaining
// ============================================================================

/// Remaining time split into whole minutes and seconds.
///
/// `total == minutes * 60 + seconds` holds for every value built through
/// the constructors of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRemaining {
    /// Total seconds remaining (negative only transiently, past the deadline)
    pub total: i64,
    /// `floor(total / 60)`
    pub minutes: i64,
    /// `total mod 60`
    pub seconds: i64,
}

impl TimeRemaining {
    /// Builds the value from a total number of seconds.
    pub fn from_total_seconds(total: i64) -> Self {
        Self {
            total,
            minutes: total.div_euclid(SECONDS_PER_MINUTE),
            seconds: total.rem_euclid(SECONDS_PER_MINUTE),
        }
    }

    /// Builds the value for a full duration of whole minutes.
    pub fn from_minutes(minutes: u32) -> Self {
        Self::from_total_seconds(i64::from(minutes) * SECONDS_PER_MINUTE)
    }

    /// Computes the time left until `deadline_ms` as seen at `now_ms`.
    ///
    /// Partial seconds round up, so a tick that fires a few milliseconds
    /// late still shows the second it was scheduled for.
    pub fn until(deadline_ms: i64, now_ms: i64) -> Self {
        let difference = deadline_ms - now_ms;
        let total = (difference + SECOND_IN_MILLISECONDS - 1).div_euclid(SECOND_IN_MILLISECONDS);
        Self::from_total_seconds(total)
    }

    /// Returns the same value with negative totals raised to zero.
    pub fn clamped(self) -> Self {
        if self.total < 0 {
            Self::default()
        } else {
            self
        }
    }

    /// Returns true once no time is left.
    pub fn is_elapsed(&self) -> bool {
        self.total <= 0
    }

    /// Returns the remaining time as (fractional) minutes.
    pub fn as_minutes(&self) -> f64 {
        self.total as f64 / SECONDS_PER_MINUTE as f64
    }

    /// Formats the value as zero-padded `MM:SS`.
    pub fn formatted(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

// ============================================================================
// TimerDuration
// ============================================================================

/// A nominal countdown length in whole minutes, within `0..=60`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TimerDuration(u32);

impl TimerDuration {
    /// Returns `None` when `minutes` is out of range.
    pub fn new(minutes: u32) -> Option<Self> {
        is_valid_minutes(minutes).then_some(Self(minutes))
    }

    /// Returns the duration in minutes.
    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Returns the full remaining time for this duration.
    pub fn time(&self) -> TimeRemaining {
        TimeRemaining::from_minutes(self.0)
    }
}

impl TryFrom<u32> for TimerDuration {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::new(minutes)
            .ok_or_else(|| format!("時間は0-{}分の範囲で指定してください", MAX_TIMER_MINUTES))
    }
}

impl From<TimerDuration> for u32 {
    fn from(duration: TimerDuration) -> Self {
        duration.0
    }
}

/// Returns true if `minutes` can seed a countdown.
pub fn is_valid_minutes(minutes: u32) -> bool {
    minutes <= MAX_TIMER_MINUTES
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Immutable view of the observable timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Current status
    pub status: TimerStatus,
    /// Current remaining time
    pub time: TimeRemaining,
}

impl TimerSnapshot {
    /// Creates a snapshot from its parts.
    pub fn new(status: TimerStatus, time: TimeRemaining) -> Self {
        Self { status, time }
    }

    /// Formats the remaining time as `MM:SS`.
    pub fn formatted(&self) -> String {
        self.time.formatted()
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.status == TimerStatus::Stopped
    }

    pub fn is_finished(&self) -> bool {
        self.status == TimerStatus::Finished
    }
}

// ============================================================================
// Tests
// ============================================================================
