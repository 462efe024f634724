//! Game clock for Tilewar rooms.
//!
//! A room runs one [`TickScheduler`] that fires once per second while a
//! game is in progress. Turn and battle timers are plain [`Countdown`]s
//! advanced by those ticks, so timer logic stays synchronous and testable
//! without a runtime.
//!
//! # Stopped mode
//!
//! A new scheduler is stopped: [`TickScheduler::wait_for_tick`] pends
//! forever until [`TickScheduler::start`] is called. Lobby rooms never
//! tick.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* lobby and game commands */ }
//!         _ = clock.wait_for_tick() => { /* advance countdowns */ }
//!     }
//! }
//! ```

mod countdown;

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

pub use countdown::{Countdown, CountdownTick};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Timers count in whole ticks.
    pub period: Duration,
    /// Random delay (0..max µs) added to the first tick after `start`, so
    /// rooms started together do not wake together.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// Shortest accepted period.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Raises a too-short period to [`Self::MIN_PERIOD`].
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(
                period_ms = self.period.as_millis() as u64,
                "tick period below minimum, clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-period clock owned by one room actor.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// `None` while stopped.
    next_tick: Option<Instant>,
}

impl TickScheduler {
    /// A stopped scheduler.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        debug!(
            period_ms = config.period.as_millis() as u64,
            "tick scheduler created"
        );
        Self {
            config,
            tick_count: 0,
            next_tick: None,
        }
    }

    pub fn with_period(period: Duration) -> Self {
        Self::new(TickConfig::with_period(period))
    }

    /// Begins ticking one period (plus jitter) from now. Restarting a
    /// running clock reschedules it.
    pub fn start(&mut self) {
        let jitter = if self.config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..self.config.initial_jitter_us))
        } else {
            Duration::ZERO
        };
        self.next_tick = Some(Instant::now() + self.config.period + jitter);
        debug!(tick = self.tick_count, "tick scheduler started");
    }

    /// Stops the clock. `wait_for_tick` pends until the next `start`.
    pub fn stop(&mut self) {
        if self.next_tick.take().is_some() {
            debug!(tick = self.tick_count, "tick scheduler stopped");
        }
    }

    /// Waits for the next tick and returns its number, counted from 1.
    ///
    /// Pends forever while stopped; `tokio::select!` keeps serving its
    /// other branches. A late wake-up schedules the next tick one period
    /// from now rather than catching up.
    pub async fn wait_for_tick(&mut self) -> u64 {
        let Some(next) = self.next_tick else {
            return std::future::pending().await;
        };

        time::sleep_until(next).await;
        self.tick_count += 1;
        self.next_tick = Some(Instant::now() + self.config.period);

        trace!(tick = self.tick_count, "tick fired");
        self.tick_count
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn period(&self) -> Duration {
        self.config.period
    }
}
