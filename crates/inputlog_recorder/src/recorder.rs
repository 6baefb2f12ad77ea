//! Recording sessions.
//!
//! A [`Recorder`] turns raw host events into log lines: it stamps each event
//! against the session time base, runs it through the [`EventFilter`] and
//! appends it to the sink, flushing after every line so a crash loses at most
//! the write in flight.

use crate::codec::{self, EventKind, LogEntry};
use crate::config::RecorderConfig;
use crate::error::{Error, Result};
use crate::filter::{EventFilter, FilterReason};
use crate::host::{Host, RawEvent, TouchPhase};
use crate::time::{Clock, TimeBase};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// What happened to one raw event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Appended to the log.
    Written(LogEntry),
    /// Suppressed by the filtering policy.
    Filtered(FilterReason),
    /// Not an event kind the log carries.
    Ignored,
    /// The recorder has been stopped.
    Inactive,
}

/// Counters for one recording session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecorderStats {
    pub recorded: u64,
    pub filtered: u64,
    pub ignored: u64,
}

/// One active recording session writing to `W`.
pub struct Recorder<W: Write> {
    sink: Option<W>,
    time_base: TimeBase,
    filter: EventFilter,
    config: RecorderConfig,
    last_timestamp_us: Option<u64>,
    stats: RecorderStats,
}

impl Recorder<BufWriter<File>> {
    /// Create (or truncate) the log file at `path` and start recording.
    pub fn create(
        path: impl AsRef<Path>,
        clock: &impl Clock,
        config: RecorderConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::CannotOpenSink {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Recording input events to {}", path.display());
        Self::new(BufWriter::new(file), clock, config)
    }
}

impl<W: Write> Recorder<W> {
    /// Start recording into `sink`.
    ///
    /// Writes the log header and captures the session start time.
    pub fn new(mut sink: W, clock: &impl Clock, config: RecorderConfig) -> Result<Self> {
        codec::write_header(&mut sink)?;
        sink.flush()?;

        Ok(Self {
            sink: Some(sink),
            time_base: TimeBase::start(clock),
            filter: EventFilter::new(config.clone()),
            config,
            last_timestamp_us: None,
            stats: RecorderStats::default(),
        })
    }

    /// Check if the session is still armed.
    pub fn is_recording(&self) -> bool {
        self.sink.is_some()
    }

    pub fn stats(&self) -> RecorderStats {
        self.stats
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Number of entries written so far.
    pub fn recorded(&self) -> u64 {
        self.stats.recorded
    }

    /// Record one raw event.
    pub fn record(&mut self, host: &impl Host, event: &RawEvent) -> Result<RecordOutcome> {
        if self.sink.is_none() {
            return Ok(RecordOutcome::Inactive);
        }

        let Some((mut entry, repeat)) = self.translate(host, event) else {
            self.stats.ignored += 1;
            return Ok(RecordOutcome::Ignored);
        };

        entry.timestamp_us = self.stamp(self.time_base.now_us(host));

        if let Some(reason) = self.filter.check(&entry, repeat) {
            self.stats.filtered += 1;
            tracing::trace!(?reason, kind = %entry.kind, "Filtered input event");
            return Ok(RecordOutcome::Filtered(reason));
        }

        if let Some(sink) = self.sink.as_mut() {
            codec::write_entry(sink, &entry)?;
            sink.flush()?;
        }

        self.filter.accept(&entry);
        self.last_timestamp_us = Some(entry.timestamp_us);
        self.stats.recorded += 1;
        Ok(RecordOutcome::Written(entry))
    }

    /// Advance `now` past the previous entry so timestamps strictly increase.
    fn stamp(&self, now: u64) -> u64 {
        match self.last_timestamp_us {
            Some(previous) if now <= previous => previous + 1,
            _ => now,
        }
    }

    /// Map a raw event to an unstamped entry plus its auto-repeat flag.
    fn translate(&self, host: &impl Host, event: &RawEvent) -> Option<(LogEntry, bool)> {
        let entry = |kind, x, y, code, modifiers| LogEntry {
            timestamp_us: 0,
            kind,
            x,
            y,
            code,
            modifiers,
        };

        match *event {
            RawEvent::MouseButton {
                button,
                pressed,
                x,
                y,
                ..
            } => {
                let kind = if pressed {
                    EventKind::MouseDown
                } else {
                    EventKind::MouseUp
                };
                Some((entry(kind, x, y, button as i64, 0), false))
            }
            RawEvent::MouseMotion { x, y, .. } => {
                Some((entry(EventKind::MouseMotion, x, y, 0, 0), false))
            }
            RawEvent::Key {
                keycode,
                modifiers,
                pressed,
                repeat,
                ..
            } => {
                let kind = if pressed {
                    EventKind::KeyDown
                } else {
                    EventKind::KeyUp
                };
                Some((entry(kind, 0, 0, keycode as i64, modifiers as u32), repeat))
            }
            RawEvent::Touch {
                window,
                finger_id,
                phase,
                x,
                y,
                ..
            } => {
                if !self.config.record_touch {
                    return None;
                }
                let (width, height) = host.window_size(window);
                let kind = match phase {
                    TouchPhase::Down => EventKind::FingerDown,
                    TouchPhase::Up => EventKind::FingerUp,
                    TouchPhase::Motion => EventKind::FingerMotion,
                };
                let px = (x * width as f32) as i32;
                let py = (y * height as f32) as i32;
                Some((entry(kind, px, py, finger_id, 0), false))
            }
            RawEvent::Other => None,
        }
    }

    /// Write the trailer, flush and close the sink.
    ///
    /// Calling this on a stopped recorder does nothing.
    pub fn stop(&mut self) -> Result<()> {
        match self.sink.take() {
            Some(mut sink) => {
                Self::terminate(&mut sink)?;
                tracing::info!(
                    recorded = self.stats.recorded,
                    filtered = self.stats.filtered,
                    "Recording stopped"
                );
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Stop recording and hand back the sink.
    ///
    /// Returns `None` if the recorder was already stopped.
    pub fn finish(mut self) -> Result<Option<W>> {
        match self.sink.take() {
            Some(mut sink) => {
                Self::terminate(&mut sink)?;
                Ok(Some(sink))
            }
            None => Ok(None),
        }
    }

    fn terminate(sink: &mut W) -> Result<()> {
        codec::write_trailer(sink)?;
        sink.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for Recorder<W> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!("Failed to terminate event log: {}", err);
        }
    }
}
