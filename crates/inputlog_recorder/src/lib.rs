//! Input event recording and replay.
//!
//! This crate captures pointer, key and touch events from an interactive
//! window into a timestamped text log and plays the log back with the
//! original timing:
//!
//! - **Recorder**: raw event -> filter/dedup -> timestamp -> append to log
//! - **Replayer**: read line -> parse -> reconstruct -> bounded queue ->
//!   wait for fire time -> inject
//!
//! The two halves never share state; they agree only on the log format in
//! [`codec`]. Both are driven cooperatively from the application's own
//! event loop through the [`Host`] trait.
//!
//! # Example
//!
//! ```no_run
//! use inputlog_recorder::{Host, SessionControl, WindowId};
//!
//! fn run(host: &mut impl Host) -> inputlog_recorder::Result<()> {
//!     let mut control = SessionControl::default();
//!     control.begin_replay("events.log", &*host, WindowId(1))?;
//!
//!     loop {
//!         for _event in control.pump(host) {
//!             // Handle live events...
//!         }
//!         if !control.process_step(host) {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod host;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod testing;
pub mod time;

pub use codec::{summarize, EventKind, LogEntry, LogReader, LogSummary};
pub use config::{RecorderConfig, ReplayConfig};
pub use error::{Error, InjectionError, LineError, ReconstructError, Result};
pub use filter::{EventFilter, FilterReason};
pub use host::{Host, InjectedEvent, RawEvent, TouchPhase, WindowId};
pub use recorder::{RecordOutcome, Recorder, RecorderStats};
pub use replay::{ReplayState, ReplayStats, Replayer};
pub use session::SessionControl;
pub use time::{Clock, SystemClock, TimeBase, Timestamp};
