//! Deterministic in-memory host.
//!
//! The clock only moves when a test advances it or when the engine sleeps,
//! so replay timing can be asserted exactly.

use crate::error::InjectionError;
use crate::host::{Host, InjectedEvent, RawEvent, WindowId};
use crate::time::Clock;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// An injected event and the host time it arrived at.
#[derive(Clone, Debug, PartialEq)]
pub struct InjectionRecord {
    /// Microseconds since the host was created.
    pub at_us: u64,
    pub event: InjectedEvent,
}

#[derive(Debug, Default)]
struct MockState {
    ticks: u64,
    pending: VecDeque<RawEvent>,
    injected: Vec<InjectionRecord>,
    sleeps: Vec<Duration>,
    inject_attempts: usize,
    failing_attempts: HashSet<usize>,
}

/// A host with a virtual clock.
///
/// Clones share state, so a test can keep a handle for inspection while the
/// engine drives another.
#[derive(Clone, Debug)]
pub struct MockHost {
    state: Arc<Mutex<MockState>>,
    frequency: u64,
    window_size: (u32, u32),
    loopback: bool,
}

impl MockHost {
    /// Create a host with a 1 MHz counter and an 800x600 window.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            frequency: 1_000_000,
            window_size: (800, 600),
            loopback: false,
        }
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn with_frequency(mut self, frequency: u64) -> Self {
        self.frequency = frequency.max(1);
        self
    }

    /// Echo injected events back into the pending queue as raw events,
    /// the way a real event loop delivers pushed events.
    pub fn with_loopback(mut self, loopback: bool) -> Self {
        self.loopback = loopback;
        self
    }

    /// Move the clock forward.
    pub fn advance_us(&self, micros: u64) {
        let ticks = (micros as u128 * self.frequency as u128 / 1_000_000) as u64;
        self.state.lock().ticks += ticks;
    }

    /// Microseconds since the host was created.
    pub fn now_us(&self) -> u64 {
        let ticks = self.state.lock().ticks;
        (ticks as u128 * 1_000_000 / self.frequency as u128) as u64
    }

    /// Queue a raw event for `poll_event`.
    pub fn push_event(&self, event: RawEvent) {
        self.state.lock().pending.push_back(event);
    }

    /// Make the `attempt`-th call to `inject` (0-based) fail.
    pub fn fail_injection(&self, attempt: usize) {
        self.state.lock().failing_attempts.insert(attempt);
    }

    /// Successfully injected events, in order.
    pub fn injected(&self) -> Vec<InjectionRecord> {
        self.state.lock().injected.clone()
    }

    /// Every sleep requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }

    pub fn inject_attempts(&self) -> usize {
        self.state.lock().inject_attempts
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockHost {
    fn counter(&self) -> u64 {
        self.state.lock().ticks
    }

    fn frequency(&self) -> u64 {
        self.frequency
    }

    fn sleep(&self, duration: Duration) {
        self.state.lock().sleeps.push(duration);
        self.advance_us(duration.as_micros() as u64);
    }
}

impl Host for MockHost {
    fn poll_event(&mut self) -> Option<RawEvent> {
        self.state.lock().pending.pop_front()
    }

    fn inject(&mut self, event: InjectedEvent) -> Result<(), InjectionError> {
        let at_us = self.now_us();
        let mut state = self.state.lock();

        let attempt = state.inject_attempts;
        state.inject_attempts += 1;
        if state.failing_attempts.contains(&attempt) {
            return Err(InjectionError(format!("attempt {} rejected", attempt)));
        }

        if self.loopback {
            state.pending.push_back(raw_from_injected(&event));
        }
        state.injected.push(InjectionRecord { at_us, event });
        Ok(())
    }

    fn window_size(&self, _window: WindowId) -> (u32, u32) {
        self.window_size
    }
}

fn raw_from_injected(event: &InjectedEvent) -> RawEvent {
    match *event {
        InjectedEvent::MouseMotion { window, x, y, .. } => RawEvent::MouseMotion { window, x, y },
        InjectedEvent::MouseButton {
            window,
            button,
            pressed,
            clicks,
            x,
            y,
        } => RawEvent::MouseButton {
            window,
            button,
            pressed,
            clicks,
            x,
            y,
        },
        InjectedEvent::Key {
            window,
            keycode,
            modifiers,
            pressed,
            repeat,
        } => RawEvent::Key {
            window,
            keycode,
            modifiers,
            pressed,
            repeat,
        },
        InjectedEvent::Touch {
            window,
            finger_id,
            phase,
            x,
            y,
            pressure,
        } => RawEvent::Touch {
            window,
            finger_id,
            phase,
            x,
            y,
            pressure,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeBase;

    #[test]
    fn test_clock_advances_on_sleep() {
        let host = MockHost::new();
        host.advance_us(100);
        host.sleep(Duration::from_micros(400));
        assert_eq!(host.now_us(), 500);
        assert_eq!(host.sleeps(), vec![Duration::from_micros(400)]);
    }

    #[test]
    fn test_frequency_conversion() {
        let host = MockHost::new().with_frequency(3_000_000);
        let base = TimeBase::start(&host);
        host.advance_us(2_000);
        assert_eq!(host.counter(), 6_000);
        assert_eq!(base.now_us(&host), 2_000);
    }

    #[test]
    fn test_loopback_and_failures() {
        let mut host = MockHost::new().with_loopback(true);
        host.fail_injection(0);
        let event = InjectedEvent::MouseMotion {
            window: WindowId(0),
            x: 3,
            y: 4,
            xrel: 0,
            yrel: 0,
            state: 0,
        };

        assert!(host.inject(event.clone()).is_err());
        assert!(host.poll_event().is_none());

        host.inject(event).unwrap();
        assert_eq!(
            host.poll_event(),
            Some(RawEvent::MouseMotion {
                window: WindowId(0),
                x: 3,
                y: 4
            })
        );
        assert_eq!(host.inject_attempts(), 2);
        assert_eq!(host.injected().len(), 1);
    }
}
