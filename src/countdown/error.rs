//! Countdown engine error types.
//!
//! Control operations report failures through their returned `Result`.
//! None of these errors are fatal: callers are expected to log or ignore them.

use thiserror::Error;

use crate::types::TimerStatus;

/// Errors returned by the countdown control operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// `resume` was called while the timer was not paused.
    #[error("タイマーは一時停止していません（現在の状態: {status}）")]
    InvalidState {
        /// Status at the time of the call
        status: TimerStatus,
    },

    /// The engine task is no longer running.
    #[error("タイマーエンジンが停止しています")]
    EngineClosed,
}

impl TimerError {
    /// Returns true if this error is a rejected state transition.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Returns the status reported by an invalid transition.
    #[must_use]
    pub fn current_status(&self) -> Option<TimerStatus> {
        match self {
            Self::InvalidState { status } => Some(*status),
            Self::EngineClosed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_names_status() {
        let err = TimerError::InvalidState {
            status: TimerStatus::Running,
        };
        assert!(err.to_string().contains("running"));
        assert!(err.to_string().contains("一時停止していません"));
    }

    #[test]
    fn test_predicates() {
        let err = TimerError::InvalidState {
            status: TimerStatus::Stopped,
        };
        assert!(err.is_invalid_state());
        assert_eq!(err.current_status(), Some(TimerStatus::Stopped));

        assert!(!TimerError::EngineClosed.is_invalid_state());
        assert_eq!(TimerError::EngineClosed.current_status(), None);
    }
}
