//! Whole-second stopwatch driven by an injected tick source.

use std::fmt;

use serde::Serialize;

use crate::format::format_clock;
use crate::tick::{IntervalTickSource, TICK_PERIOD, TickSource, Ticker};

/// Stopwatch run state. A paused stopwatch is `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
}

impl TimerState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counts elapsed whole seconds while running.
///
/// The stopwatch holds a ticker only while `Running`; pausing, resetting or
/// dropping the stopwatch cancels it, so no tick source outlives the timer.
pub struct Stopwatch<S: TickSource = IntervalTickSource> {
    source: S,
    ticker: Option<S::Ticker>,
    elapsed: u64,
}

impl<S: TickSource> fmt::Debug for Stopwatch<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stopwatch")
            .field("state", &self.state())
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

impl Default for Stopwatch<IntervalTickSource> {
    fn default() -> Self {
        Self::new(IntervalTickSource)
    }
}

impl<S: TickSource> Stopwatch<S> {
    /// Creates an idle stopwatch at zero.
    pub const fn new(source: S) -> Self {
        Self {
            source,
            ticker: None,
            elapsed: 0,
        }
    }

    pub const fn state(&self) -> TimerState {
        if self.ticker.is_some() {
            TimerState::Running
        } else {
            TimerState::Idle
        }
    }

    pub const fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Elapsed whole seconds.
    pub const fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Elapsed time as `HH:MM:SS`.
    pub fn formatted_time(&self) -> String {
        format_clock(self.elapsed)
    }

    /// Starts ticking. Does nothing if already running.
    pub fn start(&mut self) {
        if self.ticker.is_some() {
            return;
        }
        self.ticker = Some(self.source.start(TICK_PERIOD));
        tracing::debug!(elapsed = self.elapsed, "stopwatch started");
    }

    /// Stops ticking and keeps the elapsed time.
    pub fn pause(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
            tracing::debug!(elapsed = self.elapsed, "stopwatch paused");
        }
    }

    /// Stops ticking and discards the elapsed time.
    pub fn reset(&mut self) {
        self.pause();
        self.elapsed = 0;
    }

    /// Overwrites the elapsed time without changing the run state.
    pub const fn set_elapsed(&mut self, seconds: u64) {
        self.elapsed = seconds;
    }

    /// Applies one tick: +1 second while running, ignored while idle.
    pub const fn on_tick(&mut self) {
        if self.ticker.is_some() {
            self.elapsed = self.elapsed.saturating_add(1);
        }
    }

    /// Waits for the next tick and applies it.
    ///
    /// Never completes while idle, which makes it safe to poll from a
    /// `select!` loop unconditionally. Cancel-safe if the ticker is.
    pub async fn next_tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
                self.on_tick();
            }
            None => std::future::pending::<()>().await,
        }
    }
}
