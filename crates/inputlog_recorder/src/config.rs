//! Recorder and replayer tuning.

use serde::{Deserialize, Serialize};

/// Default pending-event queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Configuration for a recording session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Largest per-axis displacement (pixels) treated as jitter.
    pub jitter_px: i32,
    /// Motion within `jitter_px` is dropped if it arrives within this window.
    pub jitter_window_us: u64,
    /// Auto-repeat key-downs of the same key within this window are dropped.
    pub key_repeat_window_us: u64,
    /// Whether touch events are logged at all.
    pub record_touch: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            jitter_px: 1,
            jitter_window_us: 16_000, // one frame at 60fps
            key_repeat_window_us: 16_000,
            record_touch: true,
        }
    }
}

impl RecorderConfig {
    /// Keep sub-pixel motion and key repeats; only exact position repeats are
    /// still dropped.
    pub fn without_jitter_filter() -> Self {
        Self {
            jitter_px: -1,
            jitter_window_us: 0,
            key_repeat_window_us: 0,
            record_touch: true,
        }
    }

    pub fn with_jitter(mut self, px: i32, window_us: u64) -> Self {
        self.jitter_px = px;
        self.jitter_window_us = window_us;
        self
    }

    pub fn with_key_repeat_window(mut self, window_us: u64) -> Self {
        self.key_repeat_window_us = window_us;
        self
    }

    pub fn with_touch(mut self, record_touch: bool) -> Self {
        self.record_touch = record_touch;
        self
    }
}

/// Configuration for a replay session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Number of reconstructed events buffered ahead of injection.
    pub queue_capacity: usize,
    /// Waits at or below this many microseconds are not slept.
    pub wait_threshold_us: u64,
    /// Playback speed multiplier (1.0 = recorded timing).
    pub speed: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            wait_threshold_us: 1_000,
            speed: 1.0,
        }
    }
}

impl ReplayConfig {
    /// Set the playback speed, clamped to `0.1..=10.0`.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self.speed = self.effective_speed();
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_wait_threshold(mut self, threshold_us: u64) -> Self {
        self.wait_threshold_us = threshold_us;
        self
    }

    /// Speed actually used for scheduling.
    pub fn effective_speed(&self) -> f64 {
        if self.speed.is_finite() {
            self.speed.clamp(0.1, 10.0)
        } else {
            1.0
        }
    }

    /// Queue capacity actually used; a zero-sized queue could never dispatch.
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }
}
