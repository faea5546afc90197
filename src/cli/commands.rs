//! Command definitions for the countdown CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::settings::{PomodoroMode, SettingsUpdate};
use crate::types::MAX_TIMER_MINUTES;

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomodoro countdown timer for the terminal
#[derive(Parser, Debug)]
#[command(
    name = "pomodoro-countdown",
    version,
    about = "ターミナルで動作するポモドーロタイマー",
    long_about = "壁時計に基づくカウントダウンで、一時停止・再開を繰り返しても時間がずれないポモドーロタイマー。\n\
                  各モードの時間は設定ファイルに保存されます。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run an interactive countdown session
    Run(RunArgs),

    /// Show or change the timer settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Show the current settings
    Show,

    /// Change one or more durations
    Set(SetArgs),

    /// Restore the default settings
    Reset,
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Mode to start in (pomodoro, short-break, long-break)
    #[arg(short, long, default_value = "pomodoro")]
    pub mode: PomodoroMode,

    /// Override the mode's duration for the first countdown (0-60)
    #[arg(
        short = 'n',
        long,
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_TIMER_MINUTES))
    )]
    pub minutes: Option<u32>,

    /// Switch to the next mode and start it when a countdown finishes
    #[arg(short, long)]
    pub auto_cycle: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            mode: PomodoroMode::Pomodoro,
            minutes: None,
            auto_cycle: false,
        }
    }
}

// ============================================================================
// Settings Set Arguments
// ============================================================================

/// Arguments for `settings set`. Values outside the accepted range are clamped.
#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Pomodoro duration in minutes
    #[arg(long, allow_negative_numbers = true)]
    pub pomodoro: Option<i64>,

    /// Short break duration in minutes
    #[arg(long, allow_negative_numbers = true)]
    pub short_break: Option<i64>,

    /// Long break duration in minutes
    #[arg(long, allow_negative_numbers = true)]
    pub long_break: Option<i64>,

    /// Number of pomodoros between long breaks
    #[arg(long, allow_negative_numbers = true)]
    pub long_break_interval: Option<i64>,
}

impl From<&SetArgs> for SettingsUpdate {
    fn from(args: &SetArgs) -> Self {
        Self {
            pomodoro: args.pomodoro,
            short_break: args.short_break,
            long_break: args.long_break,
            long_break_interval: args.long_break_interval,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
