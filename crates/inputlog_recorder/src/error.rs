//! Error types for recording and replay sessions

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a session from starting or continuing
#[derive(Error, Debug)]
pub enum Error {
    /// The log file could not be created or opened
    #[error("Cannot open event log {}: {source}", .path.display())]
    CannotOpenSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The replay input is missing its preamble or the preamble is corrupt
    #[error("Malformed event log header: {0}")]
    MalformedHeader(String),

    /// Reading or writing the log failed mid-session
    #[error("Event log I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// A log record that could not be turned into an entry.
///
/// Both variants are recoverable: the replayer warns and skips the line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// Wrong field count or a field that is not a number
    #[error("line {line}: malformed record: {reason}")]
    Malformed { line: usize, reason: String },

    /// The record parses but names an event kind we do not know
    #[error("line {line}: unknown event kind `{token}`")]
    UnknownKind { line: usize, token: String },
}

impl LineError {
    /// Line number (1-based) the error refers to.
    pub fn line(&self) -> usize {
        match self {
            LineError::Malformed { line, .. } | LineError::UnknownKind { line, .. } => *line,
        }
    }

    pub(crate) fn with_line(self, line: usize) -> Self {
        match self {
            LineError::Malformed { reason, .. } => LineError::Malformed { line, reason },
            LineError::UnknownKind { token, .. } => LineError::UnknownKind { line, token },
        }
    }
}

/// A log entry whose payload does not fit the host's event shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconstructError {
    #[error("button id {0} out of range")]
    ButtonOutOfRange(i64),

    #[error("key code {0} out of range")]
    KeyCodeOutOfRange(i64),

    #[error("modifier mask {0:#x} out of range")]
    ModifiersOutOfRange(u32),

    #[error("touch event for a zero-sized window")]
    EmptyWindow,
}

/// The host refused a synthetic event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Event injection failed: {0}")]
pub struct InjectionError(pub String);
