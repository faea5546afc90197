//! Interactive countdown session.
//!
//! Drives a [`CountdownTimer`] from line-based keyboard input:
//! - `p` pause, `r` resume, `s` stop, `t` start, `q` quit
//! - Redraws the countdown line on every state change
//! - Rings the bell on finish and, with auto-cycle, starts the next mode
//! - Ctrl-C stops the timer and ends the session

use std::future::pending;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::cli::display::Display;
use crate::countdown::{Clock, Countdown, CountdownOutcome, CountdownTimer, SystemClock};
use crate::settings::{PomodoroMode, SettingsStore};

// ============================================================================
// Input
// ============================================================================

/// A command typed during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Pause,
    Resume,
    Stop,
    Start,
    Quit,
    Unknown(String),
}

impl Input {
    /// Parses one input line. Blank lines yield `None`.
    fn parse(line: &str) -> Option<Self> {
        let command = line.trim().to_ascii_lowercase();
        let input = match command.as_str() {
            "" => return None,
            "p" | "pause" => Input::Pause,
            "r" | "resume" => Input::Resume,
            "s" | "stop" => Input::Stop,
            "t" | "start" => Input::Start,
            "q" | "quit" | "exit" => Input::Quit,
            _ => Input::Unknown(command),
        };
        Some(input)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Result of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Pomodoros that ran to completion
    pub completed_pomodoros: u32,
    /// Mode selected when the session ended
    pub last_mode: PomodoroMode,
}

/// An interactive session bound to a settings store.
pub struct Session {
    store: SettingsStore,
    timer: CountdownTimer,
    auto_cycle: bool,
    completed_pomodoros: u32,
}

impl Session {
    /// Creates a session in `mode`, driven by the system clock.
    pub fn new(store: SettingsStore, mode: PomodoroMode, auto_cycle: bool) -> Self {
        Self::with_clock(store, mode, auto_cycle, Arc::new(SystemClock))
    }

    /// Creates a session in `mode`, driven by the given clock.
    pub fn with_clock(
        mut store: SettingsStore,
        mode: PomodoroMode,
        auto_cycle: bool,
        clock: Arc<dyn Clock>,
    ) -> Self {
        store.set_mode(mode);
        let timer = CountdownTimer::with_clock(store.duration_source(), clock);
        Self {
            store,
            timer,
            auto_cycle,
            completed_pomodoros: 0,
        }
    }

    /// Starts a countdown (of `minutes`, if given) and processes `input`
    /// until the user quits, the countdown ends without auto-cycle, or the
    /// input closes while the timer is not running.
    pub async fn run<R>(mut self, input: R, minutes: Option<u32>) -> Result<SessionSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut input_open = true;
        let mut state = self.timer.watch();

        let mut countdown = Some(self.timer.start(minutes).await?);
        let _ = state.borrow_and_update();
        Display::show_session_start(self.store.current_mode(), &self.timer.snapshot());

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                outcome = wait_countdown(&mut countdown) => {
                    countdown = None;
                    if outcome == CountdownOutcome::Finished {
                        match self.on_finished().await? {
                            Some(next) => countdown = Some(next),
                            None => break,
                        }
                    }
                }
                line = lines.next_line(), if input_open => {
                    match line.context("標準入力の読み込みに失敗しました")? {
                        Some(line) => {
                            if let Some(input) = Input::parse(&line) {
                                if input == Input::Quit {
                                    break;
                                }
                                self.handle_input(input, &mut countdown).await?;
                            }
                        }
                        None => {
                            debug!("Input closed");
                            input_open = false;
                        }
                    }
                }
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = *state.borrow_and_update();
                    Display::show_countdown(self.store.current_mode(), &snapshot);
                }
                _ = &mut ctrl_c => {
                    info!("Interrupted");
                    break;
                }
            }

            // Nobody can resume or restart once the input is gone.
            let idle = self.timer.is_paused()
                || (!self.timer.is_running() && countdown.is_none());
            if !input_open && idle {
                break;
            }
        }

        self.timer.stop().await?;
        Display::show_session_end(self.completed_pomodoros);

        Ok(SessionSummary {
            completed_pomodoros: self.completed_pomodoros,
            last_mode: self.store.current_mode(),
        })
    }

    async fn handle_input(
        &mut self,
        input: Input,
        countdown: &mut Option<Countdown>,
    ) -> Result<()> {
        match input {
            Input::Pause => self.timer.pause().await?,
            Input::Resume => match self.timer.resume().await {
                Ok(resumed) => *countdown = Some(resumed),
                Err(e) if e.is_invalid_state() => Display::show_warning(&e.to_string()),
                Err(e) => return Err(e.into()),
            },
            Input::Stop => self.timer.stop().await?,
            Input::Start => *countdown = Some(self.timer.start(None).await?),
            Input::Unknown(command) => {
                Display::show_warning(&format!("不明なコマンドです: '{}'", command));
            }
            Input::Quit => {}
        }
        Ok(())
    }

    /// Counts the finished countdown and, with auto-cycle, starts the next mode.
    async fn on_finished(&mut self) -> Result<Option<Countdown>> {
        let mode = self.store.current_mode();
        if mode == PomodoroMode::Pomodoro {
            self.completed_pomodoros += 1;
        }
        info!(mode = %mode, completed = self.completed_pomodoros, "Countdown finished");
        Display::show_finished(mode, self.completed_pomodoros);

        if !self.auto_cycle {
            return Ok(None);
        }

        let next = self
            .store
            .settings()
            .next_mode(mode, self.completed_pomodoros);
        self.store.set_mode(next);
        Display::show_next_mode(next, self.store.time_setting(next));

        Ok(Some(self.timer.start(None).await?))
    }
}

/// Waits for the active countdown, or forever if there is none.
async fn wait_countdown(countdown: &mut Option<Countdown>) -> CountdownOutcome {
    match countdown {
        Some(countdown) => countdown.await,
        None => pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::TokioClock;
    use crate::settings::TimerSettings;
    use tokio::io::{AsyncWriteExt, BufReader};
    use tokio::time::Duration;

    fn create_store(pomodoro: u32, short_break: u32) -> SettingsStore {
        SettingsStore::new(TimerSettings {
            pomodoro,
            short_break,
            ..TimerSettings::default()
        })
    }

    fn create_session(store: SettingsStore, auto_cycle: bool) -> Session {
        Session::with_clock(
            store,
            PomodoroMode::Pomodoro,
            auto_cycle,
            Arc::new(TokioClock::starting_at(0)),
        )
    }

    mod input_tests {
        use super::*;

        #[test]
        fn test_parse_commands() {
            assert_eq!(Input::parse("p"), Some(Input::Pause));
            assert_eq!(Input::parse(" R \n"), Some(Input::Resume));
            assert_eq!(Input::parse("stop"), Some(Input::Stop));
            assert_eq!(Input::parse("t"), Some(Input::Start));
            assert_eq!(Input::parse("q"), Some(Input::Quit));
        }

        #[test]
        fn test_parse_blank_and_unknown() {
            assert_eq!(Input::parse("   "), None);
            assert_eq!(Input::parse("x"), Some(Input::Unknown("x".to_string())));
        }
    }

    mod session_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_zero_minute_session_finishes() {
            let session = create_session(create_store(25, 5), false);

            let summary = session.run(BufReader::new(&b""[..]), Some(0)).await.unwrap();

            assert_eq!(summary.completed_pomodoros, 1);
            assert_eq!(summary.last_mode, PomodoroMode::Pomodoro);
        }

        #[tokio::test(start_paused = true)]
        async fn test_quit_cancels_countdown() {
            let session = create_session(create_store(25, 5), false);

            let summary = session.run(BufReader::new(&b"q\n"[..]), None).await.unwrap();

            assert_eq!(summary.completed_pomodoros, 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_closed_input_while_paused_ends_session() {
            let session = create_session(create_store(25, 5), false);

            let summary = session.run(BufReader::new(&b"p\n"[..]), None).await.unwrap();

            assert_eq!(summary.completed_pomodoros, 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_rejected_resume_keeps_session_running() {
            let session = create_session(create_store(0, 5), false);

            let summary = session.run(BufReader::new(&b"r\n"[..]), None).await.unwrap();

            assert_eq!(summary.completed_pomodoros, 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_auto_cycle_switches_to_short_break() {
            let session = create_session(create_store(0, 1), true);
            let (reader, mut writer) = tokio::io::duplex(64);

            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                writer.write_all(b"q\n").await.unwrap();
                // Keep the pipe open until the session has read the line.
                tokio::time::sleep(Duration::from_secs(5)).await;
            });

            let summary = session.run(BufReader::new(reader), None).await.unwrap();

            assert_eq!(summary.completed_pomodoros, 1);
            assert_eq!(summary.last_mode, PomodoroMode::ShortBreak);
        }
    }
}
