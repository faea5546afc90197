//! Countdown timer module.
//!
//! This module contains the timer core:
//! - `clock`: injectable wall-clock sources
//! - `engine`: the countdown engine and its handle
//! - `error`: control operation errors

pub mod clock;
pub mod engine;
pub mod error;

pub use clock::{Clock, SystemClock, TokioClock};
pub use engine::{Countdown, CountdownOutcome, CountdownTimer, TimerEvent};
pub use error::TimerError;
