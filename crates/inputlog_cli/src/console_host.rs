//! Host that prints injected events instead of delivering them to a window.

use inputlog_recorder::{
    Clock, Host, InjectedEvent, InjectionError, RawEvent, SystemClock, TimeBase, TouchPhase,
    WindowId,
};
use std::io::Write;

/// Dry-run host: real clock, no live events, injected events written to `out`.
pub struct ConsoleHost<W> {
    clock: SystemClock,
    started: TimeBase,
    window_size: (u32, u32),
    out: W,
}

impl<W: Write> ConsoleHost<W> {
    pub fn new(window_size: (u32, u32), out: W) -> Self {
        let clock = SystemClock::new();
        Self {
            started: TimeBase::start(&clock),
            clock,
            window_size,
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W> Clock for ConsoleHost<W> {
    fn counter(&self) -> u64 {
        self.clock.counter()
    }

    fn frequency(&self) -> u64 {
        self.clock.frequency()
    }
}

impl<W: Write> Host for ConsoleHost<W> {
    fn poll_event(&mut self) -> Option<RawEvent> {
        None
    }

    fn inject(&mut self, event: InjectedEvent) -> Result<(), InjectionError> {
        let at = self.started.now(&self.clock);
        writeln!(self.out, "{:>12}  {}", at.to_string(), describe(&event))
            .map_err(|err| InjectionError(err.to_string()))
    }

    fn window_size(&self, _window: WindowId) -> (u32, u32) {
        self.window_size
    }
}

/// One-line human readable form of an injected event.
pub fn describe(event: &InjectedEvent) -> String {
    match event {
        InjectedEvent::MouseMotion { x, y, .. } => format!("motion     ({}, {})", x, y),
        InjectedEvent::MouseButton {
            button,
            pressed,
            x,
            y,
            ..
        } => format!(
            "button {} {} ({}, {})",
            button,
            if *pressed { "down" } else { "up  " },
            x,
            y
        ),
        InjectedEvent::Key {
            keycode,
            modifiers,
            pressed,
            ..
        } => format!(
            "key {} {} mod={:#x}",
            keycode,
            if *pressed { "down" } else { "up" },
            modifiers
        ),
        InjectedEvent::Touch {
            finger_id,
            phase,
            x,
            y,
            ..
        } => {
            let phase = match phase {
                TouchPhase::Down => "down",
                TouchPhase::Up => "up",
                TouchPhase::Motion => "motion",
            };
            format!("finger {} {} ({:.3}, {:.3})", finger_id, phase, x, y)
        }
    }
}
