//! Replay engine for recorded event logs.
//!
//! This module provides:
//! - `Replayer` - Read a log and inject its events with the recorded timing
//! - `EventQueue` - Bounded look-ahead buffer between file reads and injection
//! - `reconstruct` - Map a log entry back to an injectable host event
//!
//! # Example
//!
//! ```ignore
//! use inputlog_recorder::replay::Replayer;
//! use inputlog_recorder::{ReplayConfig, WindowId};
//!
//! let mut replayer = Replayer::open("events.log", &host, WindowId(1), ReplayConfig::default())?;
//!
//! // Called once per iteration of the application's event loop
//! while replayer.process_step(&mut host) {
//!     while let Some(event) = host.poll_event() {
//!         // Handle live events...
//!     }
//! }
//! ```

mod player;
mod queue;
mod simulator;

pub use player::{ReplayState, ReplayStats, Replayer};
pub use queue::{EventQueue, QueuedEvent};
pub use simulator::reconstruct;
