//! Event reconstruction for replay.
//!
//! Turns a [`LogEntry`] back into the event shape the host accepts for
//! injection. The mapping is pure: the same entry, window and window size
//! always yield the same event.

use crate::codec::{EventKind, LogEntry};
use crate::error::ReconstructError;
use crate::host::{InjectedEvent, TouchPhase, WindowId};

/// Rebuild the injectable event for `entry`.
///
/// `window_size` is only consulted for touch entries, whose pixel
/// coordinates are normalised back to `0.0..=1.0`.
pub fn reconstruct(
    entry: &LogEntry,
    window: WindowId,
    window_size: (u32, u32),
) -> Result<InjectedEvent, ReconstructError> {
    match entry.kind {
        EventKind::MouseMotion => Ok(InjectedEvent::MouseMotion {
            window,
            x: entry.x,
            y: entry.y,
            xrel: 0,
            yrel: 0,
            state: 0,
        }),
        EventKind::MouseDown | EventKind::MouseUp => {
            let button = u8::try_from(entry.code)
                .map_err(|_| ReconstructError::ButtonOutOfRange(entry.code))?;
            Ok(InjectedEvent::MouseButton {
                window,
                button,
                pressed: entry.kind == EventKind::MouseDown,
                clicks: 1,
                x: entry.x,
                y: entry.y,
            })
        }
        EventKind::KeyDown | EventKind::KeyUp => {
            let keycode = i32::try_from(entry.code)
                .map_err(|_| ReconstructError::KeyCodeOutOfRange(entry.code))?;
            let modifiers = u16::try_from(entry.modifiers)
                .map_err(|_| ReconstructError::ModifiersOutOfRange(entry.modifiers))?;
            Ok(InjectedEvent::Key {
                window,
                keycode,
                modifiers,
                pressed: entry.kind == EventKind::KeyDown,
                repeat: false,
            })
        }
        EventKind::FingerDown | EventKind::FingerUp | EventKind::FingerMotion => {
            let (width, height) = window_size;
            if width == 0 || height == 0 {
                return Err(ReconstructError::EmptyWindow);
            }
            let phase = match entry.kind {
                EventKind::FingerDown => TouchPhase::Down,
                EventKind::FingerUp => TouchPhase::Up,
                _ => TouchPhase::Motion,
            };
            Ok(InjectedEvent::Touch {
                window,
                finger_id: entry.code,
                phase,
                x: entry.x as f32 / width as f32,
                y: entry.y as f32 / height as f32,
                pressure: if phase == TouchPhase::Up { 0.0 } else { 1.0 },
            })
        }
    }
}
