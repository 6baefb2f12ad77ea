//! Replay sessions.
//!
//! The [`Replayer`] reads log lines into a bounded queue of reconstructed
//! events and injects them one per [`process_step`](Replayer::process_step),
//! sleeping at most once per step until the head's scheduled fire time.

use super::queue::{EventQueue, QueuedEvent};
use super::simulator::reconstruct;
use crate::codec::{LogEntry, LogReader};
use crate::config::ReplayConfig;
use crate::error::{Error, LineError, Result};
use crate::host::{Host, WindowId};
use crate::time::{Clock, TimeBase};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

/// Lifecycle of a replay session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayState {
    /// No session.
    Idle,
    /// Reading and injecting.
    Active,
    /// End of file reached, queued events remain.
    Draining,
    /// File and queue exhausted.
    Finished,
    /// Cancelled by `stop()`.
    Stopped,
}

impl ReplayState {
    /// Check if `process_step` still has work to do.
    pub fn is_running(&self) -> bool {
        matches!(self, ReplayState::Active | ReplayState::Draining)
    }
}

/// Counters for one replay session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub injected: u64,
    pub malformed_lines: u64,
    pub unknown_kinds: u64,
    pub reconstruct_failures: u64,
    pub injection_failures: u64,
}

impl ReplayStats {
    /// Total recoverable problems reported during the session.
    pub fn warnings(&self) -> u64 {
        self.malformed_lines
            + self.unknown_kinds
            + self.reconstruct_failures
            + self.injection_failures
    }
}

/// One active replay session reading from `R`.
pub struct Replayer<R> {
    reader: Option<LogReader<R>>,
    window: WindowId,
    time_base: TimeBase,
    queue: EventQueue,
    config: ReplayConfig,
    state: ReplayState,
    stats: ReplayStats,
}

impl Replayer<BufReader<File>> {
    /// Open the log at `path` and start replaying into `window`.
    pub fn open(
        path: impl AsRef<Path>,
        clock: &impl Clock,
        window: WindowId,
        config: ReplayConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::CannotOpenSink {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Replaying input events from {}", path.display());
        Self::new(BufReader::new(file), clock, window, config)
    }
}

impl<R: BufRead> Replayer<R> {
    /// Start replaying from `source`.
    ///
    /// Fails with [`Error::MalformedHeader`] if the preamble is missing.
    pub fn new(
        source: R,
        clock: &impl Clock,
        window: WindowId,
        config: ReplayConfig,
    ) -> Result<Self> {
        let reader = LogReader::new(source)?;
        let queue = EventQueue::with_capacity(config.effective_queue_capacity());

        Ok(Self {
            reader: Some(reader),
            window,
            time_base: TimeBase::start(clock),
            queue,
            config,
            state: ReplayState::Active,
            stats: ReplayStats::default(),
        })
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Number of events buffered ahead of injection.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run one scheduling step.
    ///
    /// Returns `false` once the session is finished or stopped.
    pub fn process_step<H: Host>(&mut self, host: &mut H) -> bool {
        if !self.state.is_running() {
            return false;
        }

        if self.queue.is_empty() {
            self.refill(host);
        }

        if let Some(next) = self.queue.pop() {
            self.dispatch(host, next);
        }

        let exhausted = self.reader.as_ref().map_or(true, |r| r.is_exhausted());
        if exhausted && self.queue.is_empty() {
            self.finish();
            return false;
        }
        if exhausted {
            self.state = ReplayState::Draining;
        }
        true
    }

    /// Read lines until the queue is full or the log runs out.
    fn refill<H: Host>(&mut self, host: &H) {
        let Some(reader) = self.reader.as_mut() else {
            return;
        };

        let window_size = host.window_size(self.window);
        let speed = self.config.effective_speed();
        let mut read_failed = false;

        while !self.queue.is_full() {
            let record = match reader.next_entry() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(err) => {
                    // A read failure ends the file side of the session; what is
                    // already queued still plays out.
                    tracing::warn!("Failed to read event log: {}", err);
                    read_failed = true;
                    break;
                }
            };

            let entry = match record {
                Ok(entry) => entry,
                Err(err) => {
                    match err {
                        LineError::Malformed { .. } => self.stats.malformed_lines += 1,
                        LineError::UnknownKind { .. } => self.stats.unknown_kinds += 1,
                    }
                    tracing::warn!("Skipping event log record: {}", err);
                    continue;
                }
            };

            let event = match reconstruct(&entry, self.window, window_size) {
                Ok(event) => event,
                Err(err) => {
                    self.stats.reconstruct_failures += 1;
                    tracing::warn!(
                        "Skipping event log record at line {}: {}",
                        reader.line_number(),
                        err
                    );
                    continue;
                }
            };

            let queued = QueuedEvent {
                fire_at_us: fire_time(&entry, speed),
                entry,
                event,
            };
            if self.queue.push(queued).is_err() {
                // Guarded by is_full above
                break;
            }
        }

        if read_failed {
            self.reader = None;
        }
        tracing::debug!(queued = self.queue.len(), "Refilled replay queue");
    }

    /// Wait for the event's fire time, then inject it.
    fn dispatch<H: Host>(&mut self, host: &mut H, next: QueuedEvent) {
        let now = self.time_base.now_us(&*host);
        let wait = next.fire_at_us.saturating_sub(now);
        if wait > self.config.wait_threshold_us {
            host.sleep(Duration::from_micros(wait));
        }

        match host.inject(next.event) {
            Ok(()) => self.stats.injected += 1,
            Err(err) => {
                self.stats.injection_failures += 1;
                tracing::warn!(
                    kind = %next.entry.kind,
                    timestamp_us = next.entry.timestamp_us,
                    "{}",
                    err
                );
            }
        }
    }

    fn finish(&mut self) {
        self.reader = None;
        self.state = ReplayState::Finished;
        tracing::info!(
            injected = self.stats.injected,
            warnings = self.stats.warnings(),
            "Replay finished"
        );
    }

    /// Close the log and cancel the session.
    ///
    /// Takes effect at the next step; calling it again does nothing.
    pub fn stop(&mut self) {
        if self.state == ReplayState::Stopped {
            return;
        }
        self.reader = None;
        self.queue.clear();
        if self.state.is_running() {
            tracing::info!(injected = self.stats.injected, "Replay stopped");
        }
        self.state = ReplayState::Stopped;
    }
}

/// Session-relative fire time for `entry` at the given playback speed.
fn fire_time(entry: &LogEntry, speed: f64) -> u64 {
    if speed == 1.0 {
        entry.timestamp_us
    } else {
        (entry.timestamp_us as f64 / speed) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EventKind;
    use crate::host::InjectedEvent;
    use crate::testing::MockHost;
    use std::io::Cursor;

    const WINDOW: WindowId = WindowId(1);

    const EXAMPLE: &str = "# Scrcpy Event Log\n\
                           # Timestamp Type X Y KeyCode Modifiers\n\
                           # ----------------------------------------\n\
                           0 MOUSE_DOWN 10 20 1 0x0\n\
                           5000 MOUSE_MOTION 15 25 0 0x0\n\
                           9000 MOUSE_UP 15 25 1 0x0\n\
                           # End of log\n";

    fn replayer(log: &str, host: &MockHost, config: ReplayConfig) -> Replayer<Cursor<Vec<u8>>> {
        Replayer::new(Cursor::new(log.as_bytes().to_vec()), host, WINDOW, config).unwrap()
    }

    fn run_to_end(replayer: &mut Replayer<Cursor<Vec<u8>>>, host: &mut MockHost) -> usize {
        let mut steps = 1;
        while replayer.process_step(host) {
            steps += 1;
            assert!(steps < 10_000, "replay did not terminate");
        }
        steps
    }

    #[test]
    fn test_example_log_timing() {
        let mut host = MockHost::new();
        let mut replayer = replayer(EXAMPLE, &host, ReplayConfig::default());
        assert_eq!(replayer.state(), ReplayState::Active);

        assert!(replayer.process_step(&mut host));
        assert!(replayer.process_step(&mut host));
        assert_eq!(replayer.state(), ReplayState::Draining);
        assert!(!replayer.process_step(&mut host));
        assert_eq!(replayer.state(), ReplayState::Finished);

        let injected = host.injected();
        assert_eq!(injected.len(), 3);
        assert_eq!(injected[0].at_us, 0);
        assert_eq!(injected[1].at_us, 5_000);
        assert_eq!(injected[2].at_us, 9_000);
        assert_eq!(
            injected[0].event,
            InjectedEvent::MouseButton {
                window: WINDOW,
                button: 1,
                pressed: true,
                clicks: 1,
                x: 10,
                y: 20,
            }
        );
        assert_eq!(injected[1].event.position(), Some((15, 25)));
        assert_eq!(
            host.sleeps(),
            vec![Duration::from_micros(5_000), Duration::from_micros(4_000)]
        );
    }

    #[test]
    fn test_short_waits_are_not_slept() {
        let log = "# Scrcpy Event Log\n0 KEY_DOWN 0 0 97 0x0\n800 KEY_UP 0 0 97 0x0\n";
        let mut host = MockHost::new();
        let mut replayer = replayer(log, &host, ReplayConfig::default());
        run_to_end(&mut replayer, &mut host);

        assert!(host.sleeps().is_empty());
        assert_eq!(replayer.stats().injected, 2);
    }

    #[test]
    fn test_late_events_fire_immediately() {
        let mut host = MockHost::new();
        let mut replayer = replayer(EXAMPLE, &host, ReplayConfig::default());

        // The driver loop was busy for 20ms before the first step
        host.advance_us(20_000);
        run_to_end(&mut replayer, &mut host);

        assert!(host.sleeps().is_empty());
        assert_eq!(host.injected().len(), 3);
    }

    #[test]
    fn test_malformed_and_unknown_lines_are_skipped() {
        let log = "# Scrcpy Event Log\n\
                   0 MOUSE_DOWN 10 20 1 0x0\n\
                   1000 MOUSE_MOTION 11 20\n\
                   2000 MOUSE_WHEEL 0 0 0 0x0\n\
                   3000 MOUSE_UP 11 20 1 0x0\n";
        let mut host = MockHost::new();
        let mut replayer = replayer(log, &host, ReplayConfig::default());
        run_to_end(&mut replayer, &mut host);

        let stats = replayer.stats();
        assert_eq!(stats.injected, 2);
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(stats.unknown_kinds, 1);
        assert_eq!(stats.warnings(), 2);
        assert_eq!(replayer.state(), ReplayState::Finished);
    }

    #[test]
    fn test_injection_failure_does_not_stop_replay() {
        let mut host = MockHost::new();
        host.fail_injection(1);
        let mut replayer = replayer(EXAMPLE, &host, ReplayConfig::default());
        run_to_end(&mut replayer, &mut host);

        assert_eq!(replayer.stats().injection_failures, 1);
        assert_eq!(replayer.stats().injected, 2);
        let kinds: Vec<_> = host
            .injected()
            .iter()
            .map(|r| matches!(r.event, InjectedEvent::MouseButton { .. }))
            .collect();
        assert_eq!(kinds, vec![true, true]);
    }

    #[test]
    fn test_queue_refills_beyond_capacity() {
        let mut log = String::from("# Scrcpy Event Log\n");
        for i in 0..10u64 {
            log.push_str(&format!("{} MOUSE_MOTION {} 0 0 0x0\n", i * 100, i * 5));
        }

        let mut host = MockHost::new();
        let config = ReplayConfig::default().with_queue_capacity(3);
        let mut replayer = replayer(&log, &host, config);

        let mut max_pending = 0;
        while replayer.process_step(&mut host) {
            max_pending = max_pending.max(replayer.pending());
        }

        assert!(max_pending <= 3);
        let xs: Vec<_> = host
            .injected()
            .iter()
            .filter_map(|r| r.event.position())
            .map(|(x, _)| x)
            .collect();
        assert_eq!(xs, (0..10).map(|i| i * 5).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_log_finishes_on_first_step() {
        let mut host = MockHost::new();
        let log = "# Scrcpy Event Log\n# End of log\n";
        let mut replayer = replayer(log, &host, ReplayConfig::default());
        assert!(!replayer.process_step(&mut host));
        assert_eq!(replayer.state(), ReplayState::Finished);
        assert!(host.injected().is_empty());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut host = MockHost::new();
        let mut replayer = replayer(EXAMPLE, &host, ReplayConfig::default());

        assert!(replayer.process_step(&mut host));
        replayer.stop();
        replayer.stop();
        assert_eq!(replayer.state(), ReplayState::Stopped);
        assert_eq!(replayer.pending(), 0);
        assert!(!replayer.process_step(&mut host));
        assert_eq!(host.injected().len(), 1);
    }

    #[test]
    fn test_speed_scales_fire_times() {
        let mut host = MockHost::new();
        let config = ReplayConfig::default().with_speed(2.0);
        let mut replayer = replayer(EXAMPLE, &host, config);
        run_to_end(&mut replayer, &mut host);

        let times: Vec<_> = host.injected().iter().map(|r| r.at_us).collect();
        assert_eq!(times, vec![0, 2_500, 4_500]);
    }

    #[test]
    fn test_missing_header_rejected() {
        let host = MockHost::new();
        let result = Replayer::new(
            Cursor::new(b"0 MOUSE_DOWN 1 1 1 0x0\n".to_vec()),
            &host,
            WINDOW,
            ReplayConfig::default(),
        );
        assert!(matches!(result, Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let host = MockHost::new();
        let dir = tempfile::tempdir().unwrap();
        let result = Replayer::open(
            dir.path().join("nope.log"),
            &host,
            WINDOW,
            ReplayConfig::default(),
        );
        assert!(matches!(result, Err(Error::CannotOpenSink { .. })));
    }

    #[test]
    fn test_fire_time() {
        let entry = LogEntry {
            timestamp_us: 9_000,
            kind: EventKind::MouseUp,
            x: 0,
            y: 0,
            code: 1,
            modifiers: 0,
        };
        assert_eq!(fire_time(&entry, 1.0), 9_000);
        assert_eq!(fire_time(&entry, 0.5), 18_000);
    }
}
