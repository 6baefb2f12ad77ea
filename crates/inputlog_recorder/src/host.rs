//! The host windowing system, seen through the narrow interface the
//! recorder and replayer need.
//!
//! Raw events flow in through [`Host::poll_event`]; synthetic events flow
//! back out through [`Host::inject`].

use crate::error::InjectionError;
use crate::time::Clock;

/// Opaque identifier of a host window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

/// Phase of a touch contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Down,
    Up,
    Motion,
}

/// An input event as delivered by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum RawEvent {
    /// Pointer button pressed or released.
    MouseButton {
        window: WindowId,
        button: u8,
        pressed: bool,
        clicks: u8,
        x: i32,
        y: i32,
    },
    /// Pointer moved.
    MouseMotion { window: WindowId, x: i32, y: i32 },
    /// Key pressed or released.
    Key {
        window: WindowId,
        keycode: i32,
        modifiers: u16,
        pressed: bool,
        repeat: bool,
    },
    /// Touch contact, coordinates normalised to `0.0..=1.0`.
    Touch {
        window: WindowId,
        finger_id: i64,
        phase: TouchPhase,
        x: f32,
        y: f32,
        pressure: f32,
    },
    /// Anything else the host reports (window, clipboard, quit...).
    Other,
}

/// A synthetic event handed back to the host during replay.
#[derive(Clone, Debug, PartialEq)]
pub enum InjectedEvent {
    MouseMotion {
        window: WindowId,
        x: i32,
        y: i32,
        xrel: i32,
        yrel: i32,
        /// Pressed-button mask.
        state: u32,
    },
    MouseButton {
        window: WindowId,
        button: u8,
        pressed: bool,
        clicks: u8,
        x: i32,
        y: i32,
    },
    Key {
        window: WindowId,
        keycode: i32,
        modifiers: u16,
        pressed: bool,
        repeat: bool,
    },
    Touch {
        window: WindowId,
        finger_id: i64,
        phase: TouchPhase,
        x: f32,
        y: f32,
        pressure: f32,
    },
}

impl InjectedEvent {
    /// Check if this is a pointer event.
    pub fn is_mouse_event(&self) -> bool {
        matches!(self, Self::MouseMotion { .. } | Self::MouseButton { .. })
    }

    /// Check if this is a keyboard event.
    pub fn is_keyboard_event(&self) -> bool {
        matches!(self, Self::Key { .. })
    }

    /// Get the pixel position if this is a pointer event.
    pub fn position(&self) -> Option<(i32, i32)> {
        match self {
            Self::MouseMotion { x, y, .. } | Self::MouseButton { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }
}

/// Everything the engine consumes from the host.
pub trait Host: Clock {
    /// Next pending raw input event, or `None` if the queue is empty.
    fn poll_event(&mut self) -> Option<RawEvent>;

    /// Push a synthetic event into the host's event queue.
    fn inject(&mut self, event: InjectedEvent) -> Result<(), InjectionError>;

    /// Current size of `window` in pixels.
    fn window_size(&self, window: WindowId) -> (u32, u32);
}
