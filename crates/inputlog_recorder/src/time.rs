//! Session time base.
//!
//! Converts an opaque monotonic counter into microsecond offsets from the
//! start of a session. Tick-based clocks are too coarse to order events that
//! arrive within the same millisecond, so everything here is driven by a
//! high-resolution counter and its frequency.

use std::fmt;
use std::time::{Duration, Instant};

/// A monotonic high-resolution counter supplied by the host.
pub trait Clock {
    /// Current counter value.
    fn counter(&self) -> u64;

    /// Counter ticks per second.
    fn frequency(&self) -> u64;

    /// Block the calling loop for `duration`.
    ///
    /// The replayer calls this at most once per step.
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// `Instant`-backed clock counting nanoseconds.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn counter(&self) -> u64 {
        self.anchor.elapsed().as_nanos() as u64
    }

    fn frequency(&self) -> u64 {
        1_000_000_000
    }
}

/// A session-relative offset in microseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_micros(self.0)
    }

    /// Microseconds from `earlier` to `self`, zero if `earlier` is later.
    pub fn saturating_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0 / 1_000;
        let micros = self.0 % 1_000;
        write!(f, "{}.{:03}ms", millis, micros)
    }
}

/// Counter snapshot taken when a session opens.
///
/// The start value and frequency are captured once and never change for the
/// lifetime of the session.
#[derive(Clone, Copy, Debug)]
pub struct TimeBase {
    start: u64,
    frequency: u64,
}

impl TimeBase {
    /// Capture the session start from `clock`.
    pub fn start(clock: &impl Clock) -> Self {
        Self {
            start: clock.counter(),
            // A zero frequency would make every offset undefined
            frequency: clock.frequency().max(1),
        }
    }

    /// Microseconds elapsed since the session started.
    pub fn now_us(&self, clock: &impl Clock) -> u64 {
        let ticks = clock.counter().saturating_sub(self.start);
        let micros = (ticks as u128 * 1_000_000) / self.frequency as u128;
        micros.min(u64::MAX as u128) as u64
    }

    /// Same as [`now_us`](Self::now_us), as a [`Timestamp`].
    pub fn now(&self, clock: &impl Clock) -> Timestamp {
        Timestamp::from_micros(self.now_us(clock))
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }
}
