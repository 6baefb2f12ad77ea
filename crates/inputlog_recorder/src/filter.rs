//! Filtering policy applied before an entry is written.
//!
//! Only motion is ever suppressed. Button and key transitions always reach
//! the log: a lost "up" would leave a button logically stuck down on replay.

use crate::codec::{EventKind, LogEntry};
use crate::config::RecorderConfig;
use std::collections::HashMap;

/// Why an event was not written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterReason {
    /// Motion to the position of the previous recorded event.
    SamePosition,
    /// Motion within the jitter radius and time window.
    Jitter,
    /// Host auto-repeat of the key recorded just before.
    KeyRepeat,
}

/// Which pointer a positional entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Track {
    Mouse,
    Finger(i64),
}

impl Track {
    fn of(entry: &LogEntry) -> Option<Track> {
        match entry.kind {
            EventKind::MouseDown | EventKind::MouseUp | EventKind::MouseMotion => {
                Some(Track::Mouse)
            }
            EventKind::FingerDown | EventKind::FingerUp | EventKind::FingerMotion => {
                Some(Track::Finger(entry.code))
            }
            EventKind::KeyDown | EventKind::KeyUp => None,
        }
    }
}

/// Snapshot of the last recorded positional event.
#[derive(Clone, Copy, Debug)]
struct LastPosition {
    timestamp_us: u64,
    x: i32,
    y: i32,
    kind: Option<EventKind>,
    track: Option<Track>,
}

impl LastPosition {
    /// Impossible position so the first real event is never a duplicate.
    const SENTINEL: LastPosition = LastPosition {
        timestamp_us: 0,
        x: -1,
        y: -1,
        kind: None,
        track: None,
    };
}

/// Dedup state owned by one recorder.
#[derive(Debug)]
pub struct EventFilter {
    config: RecorderConfig,
    last_position: LastPosition,
    /// Timestamp of the last recorded key event, per key code.
    last_key_us: HashMap<i64, u64>,
}

impl EventFilter {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            last_position: LastPosition::SENTINEL,
            last_key_us: HashMap::new(),
        }
    }

    /// Decide whether `entry` should be dropped.
    ///
    /// `repeat` is the host's auto-repeat flag for key events.
    pub fn check(&self, entry: &LogEntry, repeat: bool) -> Option<FilterReason> {
        if entry.kind.is_motion() {
            return self.check_motion(entry);
        }

        if entry.kind == EventKind::KeyDown && repeat {
            if let Some(&last_us) = self.last_key_us.get(&entry.code) {
                let elapsed = entry.timestamp_us.saturating_sub(last_us);
                if elapsed <= self.config.key_repeat_window_us {
                    return Some(FilterReason::KeyRepeat);
                }
            }
        }

        None
    }

    fn check_motion(&self, entry: &LogEntry) -> Option<FilterReason> {
        let last = &self.last_position;
        if last.kind.is_none() || last.track != Track::of(entry) {
            return None;
        }

        if last.x == entry.x && last.y == entry.y {
            return Some(FilterReason::SamePosition);
        }

        let radius = i64::from(self.config.jitter_px);
        let dx = i64::from(entry.x.abs_diff(last.x));
        let dy = i64::from(entry.y.abs_diff(last.y));
        let elapsed = entry.timestamp_us.saturating_sub(last.timestamp_us);
        if dx <= radius && dy <= radius && elapsed <= self.config.jitter_window_us {
            return Some(FilterReason::Jitter);
        }

        None
    }

    /// Remember `entry` as written.
    pub fn accept(&mut self, entry: &LogEntry) {
        if entry.kind.is_key() {
            self.last_key_us.insert(entry.code, entry.timestamp_us);
        } else {
            self.last_position = LastPosition {
                timestamp_us: entry.timestamp_us,
                x: entry.x,
                y: entry.y,
                kind: Some(entry.kind),
                track: Track::of(entry),
            };
        }
    }
}
