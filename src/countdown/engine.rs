//! Countdown engine.
//!
//! This module provides the wall-clock anchored countdown:
//! - State transitions (Stopped → Running → Paused / Finished)
//! - Deadline arithmetic recomputed on every tick of a `tokio::time::interval`
//! - Read-only observation through `watch` snapshots and `broadcast` events
//! - Completion futures for each countdown
//!
//! The mutable state lives in a single engine task. [`CountdownTimer`] is a
//! handle that sends commands to it and reads the published snapshots.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::error::TimerError;
use crate::types::{
    minutes_to_milliseconds, TimeRemaining, TimerDuration, TimerSnapshot, TimerStatus,
    SECOND_IN_MILLISECONDS,
};

/// Number of events a slow subscriber may fall behind before losing some.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// TimerEvent
// ============================================================================

/// Discrete changes published to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A countdown started from `start`
    Started {
        /// Time at the moment of starting
        time: TimeRemaining,
    },
    /// One second elapsed
    Tick {
        /// Remaining time, never negative
        time: TimeRemaining,
    },
    /// The countdown was frozen
    Paused {
        /// Frozen remaining time
        time: TimeRemaining,
    },
    /// A paused countdown continued
    Resumed {
        /// Remaining time at the moment of resuming
        time: TimeRemaining,
    },
    /// The countdown was stopped and reset
    Stopped {
        /// Time after the reset
        time: TimeRemaining,
    },
    /// The deadline was reached
    Finished,
    /// The display was reset after a finished countdown
    Reinitialized {
        /// Time after the reset
        time: TimeRemaining,
    },
}

// ============================================================================
// Countdown
// ============================================================================

/// How a countdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    /// The deadline was reached
    Finished,
    /// Stopped, restarted, reconfigured, or the engine was dropped
    Cancelled,
}

/// Future that resolves once the countdown it was issued for ends.
///
/// Pausing does not resolve it; a later resume continues the same countdown.
#[derive(Debug)]
#[must_use = "a countdown does nothing unless awaited"]
pub struct Countdown {
    outcome: oneshot::Receiver<CountdownOutcome>,
}

impl Future for Countdown {
    type Output = CountdownOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.outcome)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(CountdownOutcome::Cancelled))
    }
}

// ============================================================================
// CountdownTimer
// ============================================================================

/// Commands sent from the handle to the engine task.
enum Command {
    Start {
        minutes: Option<u32>,
        reply: oneshot::Sender<Countdown>,
    },
    Pause {
        reply: oneshot::Sender<()>,
    },
    Resume {
        reply: oneshot::Sender<Result<Countdown, TimerError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a countdown engine bound to a duration source.
///
/// Dropping the handle aborts the engine task together with its interval.
pub struct CountdownTimer {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<TimerSnapshot>,
    events: broadcast::Sender<TimerEvent>,
    task: JoinHandle<()>,
}

impl CountdownTimer {
    /// Creates an engine driven by the system clock.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(duration_source: watch::Receiver<u32>) -> Self {
        Self::with_clock(duration_source, Arc::new(SystemClock))
    }

    /// Creates an engine driven by the given clock.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_clock(duration_source: watch::Receiver<u32>, clock: Arc<dyn Clock>) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(TimerSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Engine::new(duration_source, clock, state_tx, events.clone());
        let task = tokio::spawn(engine.run(command_rx));

        Self {
            commands,
            state,
            events,
            task,
        }
    }

    /// Starts a countdown of `minutes`, or of the duration source's value.
    ///
    /// Restarting while running re-anchors the deadline to now and cancels
    /// the previous countdown's completion.
    pub async fn start(&self, minutes: Option<u32>) -> Result<Countdown, TimerError> {
        self.request(|reply| Command::Start { minutes, reply }).await
    }

    /// Freezes the remaining time.
    ///
    /// Accepted in every status; see `resume` for the strict counterpart.
    pub async fn pause(&self) -> Result<(), TimerError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    /// Continues a paused countdown from its remaining time.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidState`] if the timer is not paused.
    pub async fn resume(&self) -> Result<Countdown, TimerError> {
        self.request(|reply| Command::Resume { reply }).await?
    }

    /// Cancels the countdown and resets the time to the nominal duration.
    pub async fn stop(&self) -> Result<(), TimerError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, TimerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| TimerError::EngineClosed)?;
        response.await.map_err(|_| TimerError::EngineClosed)
    }

    /// Returns the current status and time.
    pub fn snapshot(&self) -> TimerSnapshot {
        *self.state.borrow()
    }

    pub fn time(&self) -> TimeRemaining {
        self.snapshot().time
    }

    pub fn status(&self) -> TimerStatus {
        self.snapshot().status
    }

    /// Returns the remaining time as `MM:SS`.
    pub fn formatted(&self) -> String {
        self.snapshot().formatted()
    }

    pub fn is_running(&self) -> bool {
        self.snapshot().is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.snapshot().is_paused()
    }

    pub fn is_stopped(&self) -> bool {
        self.snapshot().is_stopped()
    }

    pub fn is_finished(&self) -> bool {
        self.snapshot().is_finished()
    }

    /// Returns a read-only receiver of state snapshots.
    pub fn watch(&self) -> watch::Receiver<TimerSnapshot> {
        self.state.clone()
    }

    /// Subscribes to discrete timer events.
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Engine
// ============================================================================

/// The single active periodic callback and the deadline it counts towards.
struct Ticker {
    deadline_ms: i64,
    interval: Interval,
}

/// Engine task state. Only this task writes the snapshot.
struct Engine {
    clock: Arc<dyn Clock>,
    duration_source: watch::Receiver<u32>,
    source_open: bool,
    last_minutes: u32,
    state: watch::Sender<TimerSnapshot>,
    events: broadcast::Sender<TimerEvent>,
    ticker: Option<Ticker>,
    completions: Vec<oneshot::Sender<CountdownOutcome>>,
}

impl Engine {
    fn new(
        mut duration_source: watch::Receiver<u32>,
        clock: Arc<dyn Clock>,
        state: watch::Sender<TimerSnapshot>,
        events: broadcast::Sender<TimerEvent>,
    ) -> Self {
        let last_minutes = *duration_source.borrow_and_update();
        let engine = Self {
            clock,
            duration_source,
            source_open: true,
            last_minutes,
            state,
            events,
            ticker: None,
            completions: Vec::new(),
        };

        if let Some(time) = engine.nominal_time() {
            engine.publish(TimerStatus::Stopped, time);
        }
        engine
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            // Duration changes sent before a command are applied before it.
            tokio::select! {
                biased;

                changed = self.duration_source.changed(), if self.source_open => match changed {
                    Ok(()) => self.on_duration_changed(),
                    Err(_) => {
                        debug!("Duration source closed");
                        self.source_open = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                deadline_ms = next_tick(&mut self.ticker) => self.on_tick(deadline_ms),
            }
        }

        self.cancel_completions();
        debug!("Countdown engine shut down");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start { minutes, reply } => {
                let minutes = minutes.unwrap_or_else(|| *self.duration_source.borrow());
                self.cancel_completions();
                let countdown = self.start_countdown(minutes_to_milliseconds(f64::from(minutes)));
                let time = self.snapshot().time;
                debug!(minutes, "Countdown started");
                self.emit(TimerEvent::Started { time });
                let _ = reply.send(countdown);
            }
            Command::Pause { reply } => {
                self.ticker = None;
                let time = self.snapshot().time;
                self.publish(TimerStatus::Paused, time);
                debug!(remaining = time.total, "Countdown paused");
                self.emit(TimerEvent::Paused { time });
                let _ = reply.send(());
            }
            Command::Resume { reply } => {
                let _ = reply.send(self.resume());
            }
            Command::Stop { reply } => {
                self.stop();
                let _ = reply.send(());
            }
        }
    }

    fn resume(&mut self) -> Result<Countdown, TimerError> {
        let snapshot = self.snapshot();
        if !snapshot.is_paused() {
            debug!(status = %snapshot.status, "Rejected resume");
            return Err(TimerError::InvalidState {
                status: snapshot.status,
            });
        }

        let countdown = self.start_countdown(minutes_to_milliseconds(snapshot.time.as_minutes()));
        let time = self.snapshot().time;
        debug!(remaining = time.total, "Countdown resumed");
        self.emit(TimerEvent::Resumed { time });
        Ok(countdown)
    }

    fn stop(&mut self) {
        self.ticker = None;
        self.cancel_completions();
        let time = self.nominal_time().unwrap_or(self.snapshot().time);
        self.publish(TimerStatus::Stopped, time);
        debug!("Countdown stopped");
        self.emit(TimerEvent::Stopped { time });
    }

    /// Anchors a new deadline at now + `duration_ms` and replaces the interval.
    fn start_countdown(&mut self, duration_ms: i64) -> Countdown {
        let now_ms = self.clock.now_millis();
        let deadline_ms = now_ms + duration_ms;

        let period = Duration::from_millis(SECOND_IN_MILLISECONDS as u64);
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Assigning drops the previous interval, if any.
        self.ticker = Some(Ticker {
            deadline_ms,
            interval,
        });
        self.publish(
            TimerStatus::Running,
            TimeRemaining::until(deadline_ms, now_ms),
        );

        let (tx, outcome) = oneshot::channel();
        self.completions.push(tx);
        Countdown { outcome }
    }

    fn on_tick(&mut self, deadline_ms: i64) {
        let time = TimeRemaining::until(deadline_ms, self.clock.now_millis());
        if !time.is_elapsed() {
            self.publish(TimerStatus::Running, time);
            self.emit(TimerEvent::Tick { time });
            return;
        }

        self.ticker = None;
        let time = time.clamped();
        self.publish(TimerStatus::Finished, time);
        self.emit(TimerEvent::Tick { time });
        debug!("Countdown finished");
        self.emit(TimerEvent::Finished);

        for completion in self.completions.drain(..) {
            let _ = completion.send(CountdownOutcome::Finished);
        }

        let time = self.nominal_time().unwrap_or(time);
        self.publish(TimerStatus::Stopped, time);
        self.emit(TimerEvent::Reinitialized { time });
    }

    fn on_duration_changed(&mut self) {
        let minutes = *self.duration_source.borrow_and_update();
        if minutes == self.last_minutes {
            return;
        }
        debug!(from = self.last_minutes, to = minutes, "Duration source changed");
        self.last_minutes = minutes;
        self.stop();
    }

    /// Full time for the duration source's value, if that value is valid.
    fn nominal_time(&self) -> Option<TimeRemaining> {
        let minutes = *self.duration_source.borrow();
        let duration = TimerDuration::new(minutes);
        if duration.is_none() {
            warn!(minutes, "Ignoring out-of-range duration");
        }
        duration.map(|duration| duration.time())
    }

    fn cancel_completions(&mut self) {
        for completion in self.completions.drain(..) {
            let _ = completion.send(CountdownOutcome::Cancelled);
        }
    }

    fn snapshot(&self) -> TimerSnapshot {
        *self.state.borrow()
    }

    fn publish(&self, status: TimerStatus, time: TimeRemaining) {
        self.state.send_replace(TimerSnapshot::new(status, time));
    }

    fn emit(&self, event: TimerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Waits for the next tick of the active interval, or forever if idle.
async fn next_tick(ticker: &mut Option<Ticker>) -> i64 {
    match ticker {
        Some(ticker) => {
            ticker.interval.tick().await;
            ticker.deadline_ms
        }
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::clock::TokioClock;

    fn create_timer(minutes: u32) -> (CountdownTimer, watch::Sender<u32>) {
        let (tx, rx) = watch::channel(minutes);
        let timer = CountdownTimer::with_clock(rx, Arc::new(TokioClock::starting_at(0)));
        (timer, tx)
    }

    /// Advances paused time and lets the engine task process due ticks.
    async fn advance(millis: u64) {
        tokio::time::advance(Duration::from_millis(millis)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    // ------------------------------------------------------------------------
    // Countdown Tests
    // ------------------------------------------------------------------------

    mod countdown_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_outcome_cancelled_when_sender_dropped() {
            let (tx, outcome) = oneshot::channel::<CountdownOutcome>();
            drop(tx);
            assert_eq!(Countdown { outcome }.await, CountdownOutcome::Cancelled);
        }

        #[tokio::test(start_paused = true)]
        async fn test_outcome_forwarded() {
            let (tx, outcome) = oneshot::channel();
            tx.send(CountdownOutcome::Finished).unwrap();
            assert_eq!(Countdown { outcome }.await, CountdownOutcome::Finished);
        }
    }

    // ------------------------------------------------------------------------
    // Engine Tests
    // ------------------------------------------------------------------------

    mod engine_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_new_timer_shows_nominal_duration() {
            let (timer, _tx) = create_timer(25);

            assert!(timer.is_stopped());
            assert_eq!(timer.time(), TimeRemaining::from_minutes(25));
            assert_eq!(timer.formatted(), "25:00");
        }

        #[tokio::test(start_paused = true)]
        async fn test_new_timer_with_invalid_duration_shows_zero() {
            let (timer, _tx) = create_timer(61);

            assert!(timer.is_stopped());
            assert_eq!(timer.time(), TimeRemaining::default());
        }

        #[tokio::test(start_paused = true)]
        async fn test_start_publishes_full_time_immediately() {
            let (timer, _tx) = create_timer(1);

            let _countdown = timer.start(Some(2)).await.unwrap();

            assert!(timer.is_running());
            assert_eq!(timer.formatted(), "02:00");
        }

        #[tokio::test(start_paused = true)]
        async fn test_restart_cancels_previous_countdown() {
            let (timer, _tx) = create_timer(1);

            let first = timer.start(None).await.unwrap();
            advance(5_000).await;
            let _second = timer.start(None).await.unwrap();

            assert_eq!(first.await, CountdownOutcome::Cancelled);
            assert_eq!(timer.time().total, 60);
        }

        #[tokio::test(start_paused = true)]
        async fn test_restart_keeps_single_interval() {
            let (timer, _tx) = create_timer(1);

            let _ = timer.start(None).await.unwrap();
            let _ = timer.start(None).await.unwrap();
            let _ = timer.start(None).await.unwrap();

            advance(1_000).await;
            assert_eq!(timer.time().total, 59);
            advance(1_000).await;
            assert_eq!(timer.time().total, 58);
        }

        #[tokio::test(start_paused = true)]
        async fn test_late_tick_catches_up_from_deadline() {
            let (timer, _tx) = create_timer(1);

            let _countdown = timer.start(None).await.unwrap();
            advance(10_500).await;

            assert_eq!(timer.time().total, 50);
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_minutes_finishes_on_first_tick() {
            let (timer, _tx) = create_timer(0);

            let countdown = timer.start(None).await.unwrap();

            assert_eq!(countdown.await, CountdownOutcome::Finished);
            assert!(timer.is_stopped());
            assert_eq!(timer.time(), TimeRemaining::default());
        }

        #[tokio::test(start_paused = true)]
        async fn test_pause_keeps_pending_completion() {
            let (timer, _tx) = create_timer(1);

            let countdown = timer.start(None).await.unwrap();
            advance(1_000).await;
            timer.pause().await.unwrap();
            let _resumed = timer.resume().await.unwrap();

            assert_eq!(countdown.await, CountdownOutcome::Finished);
        }

        #[tokio::test(start_paused = true)]
        async fn test_stop_cancels_completion() {
            let (timer, _tx) = create_timer(1);

            let countdown = timer.start(None).await.unwrap();
            timer.stop().await.unwrap();

            assert_eq!(countdown.await, CountdownOutcome::Cancelled);
        }

        #[tokio::test(start_paused = true)]
        async fn test_drop_cancels_completion() {
            let (timer, _tx) = create_timer(1);

            let countdown = timer.start(None).await.unwrap();
            drop(timer);

            assert_eq!(countdown.await, CountdownOutcome::Cancelled);
        }

        #[tokio::test(start_paused = true)]
        async fn test_pause_from_stopped_is_accepted() {
            let (timer, _tx) = create_timer(1);

            timer.pause().await.unwrap();

            assert!(timer.is_paused());
            assert_eq!(timer.time().total, 60);
        }

        #[tokio::test(start_paused = true)]
        async fn test_resume_after_finish_is_rejected() {
            let (timer, _tx) = create_timer(0);

            let countdown = timer.start(None).await.unwrap();
            countdown.await;

            let err = timer.resume().await.unwrap_err();
            assert!(err.is_invalid_state());
        }

        #[tokio::test(start_paused = true)]
        async fn test_same_duration_value_does_not_stop() {
            let (timer, tx) = create_timer(1);

            let _countdown = timer.start(None).await.unwrap();
            tx.send(1).unwrap();
            advance(1_000).await;

            assert!(timer.is_running());
            assert_eq!(timer.time().total, 59);
        }

        #[tokio::test(start_paused = true)]
        async fn test_invalid_duration_change_stops_but_keeps_time() {
            let (timer, tx) = create_timer(1);

            let _countdown = timer.start(None).await.unwrap();
            advance(1_000).await;
            tx.send(90).unwrap();
            advance(0).await;

            assert!(timer.is_stopped());
            assert_eq!(timer.time().total, 59);
        }

        #[tokio::test(start_paused = true)]
        async fn test_dropped_duration_source_keeps_engine_alive() {
            let (timer, tx) = create_timer(1);

            drop(tx);
            let _countdown = timer.start(None).await.unwrap();
            advance(1_000).await;

            assert_eq!(timer.time().total, 59);
            timer.stop().await.unwrap();
            assert_eq!(timer.time().total, 60);
        }
    }

    // ------------------------------------------------------------------------
    // Event Tests
    // ------------------------------------------------------------------------

    mod event_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_finish_event_sequence() {
            let (timer, _tx) = create_timer(0);
            let mut events = timer.subscribe();

            let countdown = timer.start(Some(0)).await.unwrap();
            countdown.await;

            let zero = TimeRemaining::default();
            assert_eq!(events.recv().await.unwrap(), TimerEvent::Started { time: zero });
            assert_eq!(events.recv().await.unwrap(), TimerEvent::Tick { time: zero });
            assert_eq!(events.recv().await.unwrap(), TimerEvent::Finished);
            assert_eq!(
                events.recv().await.unwrap(),
                TimerEvent::Reinitialized { time: zero }
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_pause_resume_events() {
            let (timer, _tx) = create_timer(1);
            let mut events = timer.subscribe();

            let _countdown = timer.start(None).await.unwrap();
            advance(1_000).await;
            timer.pause().await.unwrap();
            let _resumed = timer.resume().await.unwrap();

            let time = TimeRemaining::from_total_seconds(59);
            assert!(matches!(events.recv().await.unwrap(), TimerEvent::Started { .. }));
            assert_eq!(events.recv().await.unwrap(), TimerEvent::Tick { time });
            assert_eq!(events.recv().await.unwrap(), TimerEvent::Paused { time });
            assert_eq!(events.recv().await.unwrap(), TimerEvent::Resumed { time });
        }

        #[tokio::test(start_paused = true)]
        async fn test_watch_sees_each_tick() {
            let (timer, _tx) = create_timer(1);
            let mut state = timer.watch();
            let _ = state.borrow_and_update();

            let _countdown = timer.start(None).await.unwrap();
            state.changed().await.unwrap();
            assert_eq!(state.borrow_and_update().time.total, 60);

            advance(1_000).await;
            state.changed().await.unwrap();
            assert_eq!(state.borrow_and_update().formatted(), "00:59");
        }
    }
}
