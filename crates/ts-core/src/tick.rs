//! Recurring tick sources that drive the stopwatch.
//!
//! A [`TickSource`] hands out [`Ticker`]s; a ticker yields once per period
//! until it is cancelled or dropped. The stopwatch owns at most one ticker at
//! a time, so the tick lifecycle is visible (and checkable) from outside the
//! timer instead of living in a detached background task.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Period between stopwatch ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A factory for recurring tick streams.
pub trait TickSource {
    /// The ticker produced by [`TickSource::start`].
    type Ticker: Ticker;

    /// Begins a recurring tick with the given period.
    fn start(&self, period: Duration) -> Self::Ticker;
}

/// An active recurring tick.
///
/// Dropping a ticker stops tick production; [`Ticker::cancel`] makes that
/// explicit at call sites.
pub trait Ticker {
    /// Completes when the next tick is due.
    ///
    /// Implementations must be cancel-safe: dropping the returned future
    /// before it completes must not lose or duplicate a tick.
    fn tick(&mut self) -> impl Future<Output = ()> + Send;

    /// Stops the ticker.
    fn cancel(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// Tick source backed by a tokio [`Interval`].
///
/// The first tick fires one full period after start. Ticks missed while the
/// caller was busy are delivered in a burst, so the count stays aligned with
/// wall-clock time instead of drifting.
///
/// [`TickSource::start`] must be called from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalTickSource;

impl TickSource for IntervalTickSource {
    type Ticker = IntervalTicker;

    fn start(&self, period: Duration) -> Self::Ticker {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        IntervalTicker { interval }
    }
}

/// Ticker produced by [`IntervalTickSource`].
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl Ticker for IntervalTicker {
    fn tick(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            self.interval.tick().await;
        }
    }
}

/// Tick source that never fires on its own.
///
/// Callers drive the stopwatch with `Stopwatch::on_tick` and use
/// [`ManualTickSource::live`] to check that no ticker is left running.
#[derive(Debug, Clone, Default)]
pub struct ManualTickSource {
    live: Arc<AtomicUsize>,
    started: Arc<AtomicUsize>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tickers currently alive.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Number of tickers ever started.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl TickSource for ManualTickSource {
    type Ticker = ManualTicker;

    fn start(&self, _period: Duration) -> Self::Ticker {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.started.fetch_add(1, Ordering::SeqCst);
        ManualTicker {
            live: Arc::clone(&self.live),
        }
    }
}

/// Ticker produced by [`ManualTickSource`].
#[derive(Debug)]
pub struct ManualTicker {
    live: Arc<AtomicUsize>,
}

impl Ticker for ManualTicker {
    fn tick(&mut self) -> impl Future<Output = ()> + Send {
        std::future::pending()
    }
}

impl Drop for ManualTicker {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
