//! Lifecycle entry points for the application's event loop.
//!
//! [`SessionControl`] holds at most one recording and one replay session and
//! exposes the calls a driver loop makes each iteration: [`pump`] to drain
//! (and record) live events and [`process_step`] to advance replay.
//!
//! [`pump`]: SessionControl::pump
//! [`process_step`]: SessionControl::process_step

use crate::config::{RecorderConfig, ReplayConfig};
use crate::error::Result;
use crate::host::{Host, RawEvent, WindowId};
use crate::recorder::{RecordOutcome, Recorder, RecorderStats};
use crate::replay::{ReplayState, ReplayStats, Replayer};
use crate::time::Clock;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Recording and replay sessions driven from one polling loop.
pub struct SessionControl {
    recorder_config: RecorderConfig,
    replay_config: ReplayConfig,
    recorder: Option<Recorder<BufWriter<File>>>,
    replayer: Option<Replayer<BufReader<File>>>,
    last_replay: Option<ReplayStats>,
}

impl SessionControl {
    pub fn new(recorder_config: RecorderConfig, replay_config: ReplayConfig) -> Self {
        Self {
            recorder_config,
            replay_config,
            recorder: None,
            replayer: None,
            last_replay: None,
        }
    }

    /// Start recording to `path`, ending any recording already in progress.
    pub fn begin_recording(&mut self, path: impl AsRef<Path>, clock: &impl Clock) -> Result<()> {
        self.end_recording()?;
        let recorder = Recorder::create(path, clock, self.recorder_config.clone())?;
        self.recorder = Some(recorder);
        Ok(())
    }

    /// Terminate the current recording.
    ///
    /// Returns its stats, or `None` if nothing was recording.
    pub fn end_recording(&mut self) -> Result<Option<RecorderStats>> {
        match self.recorder.take() {
            Some(mut recorder) => {
                recorder.stop()?;
                Ok(Some(recorder.stats()))
            }
            None => Ok(None),
        }
    }

    /// Start replaying `path` into `window`, cancelling any replay in progress.
    pub fn begin_replay(
        &mut self,
        path: impl AsRef<Path>,
        clock: &impl Clock,
        window: WindowId,
    ) -> Result<()> {
        self.end_replay();
        let replayer = Replayer::open(path, clock, window, self.replay_config.clone())?;
        self.replayer = Some(replayer);
        Ok(())
    }

    /// Cancel the current replay, returning its stats.
    pub fn end_replay(&mut self) -> Option<ReplayStats> {
        let mut replayer = self.replayer.take()?;
        replayer.stop();
        let stats = replayer.stats();
        self.last_replay = Some(stats);
        Some(stats)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.as_ref().is_some_and(|r| r.is_recording())
    }

    pub fn is_replaying(&self) -> bool {
        self.replayer.is_some()
    }

    /// State of the current replay, `Idle` when there is none.
    pub fn replay_state(&self) -> ReplayState {
        self.replayer
            .as_ref()
            .map_or(ReplayState::Idle, |r| r.state())
    }

    /// Stats of the most recently ended replay.
    pub fn last_replay_stats(&self) -> Option<ReplayStats> {
        self.last_replay
    }

    /// Record `event` if a recording is armed.
    pub fn record(&mut self, host: &impl Host, event: &RawEvent) -> Result<RecordOutcome> {
        match self.recorder.as_mut() {
            Some(recorder) => recorder.record(host, event),
            None => Ok(RecordOutcome::Inactive),
        }
    }

    /// Advance the current replay by one step.
    ///
    /// The replay session is dropped once it finishes; returns `false` when
    /// no replay is running.
    pub fn process_step<H: Host>(&mut self, host: &mut H) -> bool {
        let Some(replayer) = self.replayer.as_mut() else {
            return false;
        };

        if replayer.process_step(host) {
            return true;
        }

        self.last_replay = Some(replayer.stats());
        self.replayer = None;
        false
    }

    /// Drain the host's pending events, recording each while armed.
    ///
    /// The events are handed back for the application to handle. A write
    /// failure ends the recording with a warning; the events are still
    /// returned.
    pub fn pump<H: Host>(&mut self, host: &mut H) -> Vec<RawEvent> {
        let mut events = Vec::new();

        while let Some(event) = host.poll_event() {
            if let Err(err) = self.record(&*host, &event) {
                tracing::warn!("Recording stopped after write failure: {}", err);
                if let Some(mut recorder) = self.recorder.take() {
                    // The sink already failed once; the trailer is best effort
                    let _ = recorder.stop();
                }
            }
            events.push(event);
        }

        events
    }
}

impl Default for SessionControl {
    fn default() -> Self {
        Self::new(RecorderConfig::default(), ReplayConfig::default())
    }
}
