//! CLI module for the countdown timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `session`: Interactive countdown session driven by keyboard input
//! - `display`: Output formatting and display logic

pub mod commands;
pub mod display;
pub mod session;

pub use commands::{Cli, Commands, RunArgs, SetArgs, SettingsCommand};
pub use display::Display;
pub use session::{Session, SessionSummary};
