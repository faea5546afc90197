//! Display utilities for the countdown CLI.
//!
//! This module provides formatted output for:
//! - The live countdown line
//! - Session messages (start, pause, finish, ...)
//! - Settings display
//! - Error messages

use std::io::{self, Write};

use crate::settings::{PomodoroMode, TimerSettings};
use crate::types::{TimerSnapshot, TimerStatus};

/// ASCII bell, rung when a countdown finishes.
const BELL: char = '\u{7}';

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Redraws the countdown line in place.
    pub fn show_countdown(mode: PomodoroMode, snapshot: &TimerSnapshot) {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "\r{}", Self::countdown_line(mode, snapshot));
        let _ = stdout.flush();
    }

    /// Shows the session banner and the key bindings.
    pub fn show_session_start(mode: PomodoroMode, snapshot: &TimerSnapshot) {
        println!("* {}を開始しました（{}）", mode.label(), snapshot.formatted());
        println!("  操作: [p] 一時停止  [r] 再開  [s] 停止  [t] 開始  [q] 終了");
    }

    /// Shows that a countdown finished and rings the terminal bell.
    pub fn show_finished(mode: PomodoroMode, completed_pomodoros: u32) {
        println!("\r{}* {}が終了しました", BELL, mode.label());
        if completed_pomodoros > 0 {
            println!("  完了したポモドーロ: {}", completed_pomodoros);
        }
    }

    /// Shows the mode chosen after a finished countdown.
    pub fn show_next_mode(mode: PomodoroMode, minutes: u32) {
        println!("> 次は{}です（{:02}:00）", mode.label(), minutes);
    }

    /// Shows that the session ended.
    pub fn show_session_end(completed_pomodoros: u32) {
        println!();
        println!("[] セッションを終了しました（完了したポモドーロ: {}）", completed_pomodoros);
    }

    /// Shows a rejected command without aborting the session.
    pub fn show_warning(message: &str) {
        println!();
        println!("! {}", message);
    }

    /// Shows the current settings.
    pub fn show_settings(settings: &TimerSettings) {
        println!("ポモドーロタイマー 設定");
        println!("─────────────────────────────");
        for line in Self::settings_lines(settings) {
            println!("{}", line);
        }
    }

    /// Shows a success message for a settings update.
    pub fn show_settings_saved(settings: &TimerSettings) {
        println!("* 設定を保存しました");
        for line in Self::settings_lines(settings) {
            println!("  {}", line);
        }
    }

    /// Shows a success message for a settings reset.
    pub fn show_settings_reset() {
        println!("* 設定を初期値に戻しました");
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Builds the live countdown line, e.g. `ポモドーロ 24:59 [実行中]`.
    fn countdown_line(mode: PomodoroMode, snapshot: &TimerSnapshot) -> String {
        format!(
            "{} {} [{}]",
            mode.label(),
            snapshot.formatted(),
            Self::status_label(snapshot.status)
        )
    }

    fn status_label(status: TimerStatus) -> &'static str {
        match status {
            TimerStatus::Running => "実行中",
            TimerStatus::Paused => "一時停止中",
            TimerStatus::Stopped => "停止中",
            TimerStatus::Finished => "終了",
        }
    }

    fn settings_lines(settings: &TimerSettings) -> Vec<String> {
        let mut lines: Vec<String> = PomodoroMode::ALL
            .iter()
            .map(|mode| format!("{}: {}分", mode.label(), settings.minutes_for(*mode)))
            .collect();
        lines.push(format!(
            "長い休憩の間隔: {}ポモドーロごと",
            settings.long_break_interval
        ));
        lines
    }
}

// ============================================================================
// Tests
// ============================================================================
