//! Testing infrastructure for code that records or replays input.
//!
//! This module provides:
//! - `MockHost` - A virtual-clock host for deterministic tests
//! - `render_log` - Build a complete log text from entries

mod mock_host;

pub use mock_host::{InjectionRecord, MockHost};

use crate::codec::{self, LogEntry};

/// Render `entries` as a complete log, header and trailer included.
pub fn render_log(entries: &[LogEntry]) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail
    let _ = codec::write_header(&mut out);
    for entry in entries {
        let _ = codec::write_entry(&mut out, entry);
    }
    let _ = codec::write_trailer(&mut out);
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EventKind;

    #[test]
    fn test_render_log() {
        let text = render_log(&[LogEntry {
            timestamp_us: 42,
            kind: EventKind::KeyUp,
            x: 0,
            y: 0,
            code: 13,
            modifiers: 0x3,
        }]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], "42 KEY_UP 0 0 13 0x3");
        assert_eq!(lines[4], codec::TRAILER);
    }
}
