//! Text log format.
//!
//! One ASCII line per entry:
//!
//! ```text
//! <timestamp_us> <KIND> <x> <y> <code> 0x<modifiers>
//! ```
//!
//! Lines starting with `#` are comments and may appear anywhere in the file.
//! A log opens with a fixed three-line header and closes with a trailer
//! comment.

use crate::error::{Error, LineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

pub const HEADER_TITLE: &str = "# Scrcpy Event Log";
pub const HEADER_COLUMNS: &str = "# Timestamp Type X Y KeyCode Modifiers";
pub const HEADER_RULE: &str = "# ----------------------------------------";
pub const TRAILER: &str = "# End of log";

const FIELD_COUNT: usize = 6;

/// Kind of a logged event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    MouseDown,
    MouseUp,
    MouseMotion,
    KeyDown,
    KeyUp,
    FingerDown,
    FingerUp,
    FingerMotion,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::MouseDown,
        EventKind::MouseUp,
        EventKind::MouseMotion,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::FingerDown,
        EventKind::FingerUp,
        EventKind::FingerMotion,
    ];

    /// The token written to the log.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MouseDown => "MOUSE_DOWN",
            EventKind::MouseUp => "MOUSE_UP",
            EventKind::MouseMotion => "MOUSE_MOTION",
            EventKind::KeyDown => "KEY_DOWN",
            EventKind::KeyUp => "KEY_UP",
            EventKind::FingerDown => "FINGER_DOWN",
            EventKind::FingerUp => "FINGER_UP",
            EventKind::FingerMotion => "FINGER_MOTION",
        }
    }

    /// Motion kinds are subject to jitter filtering; discrete kinds never are.
    pub fn is_motion(&self) -> bool {
        matches!(self, EventKind::MouseMotion | EventKind::FingerMotion)
    }

    pub fn is_key(&self) -> bool {
        matches!(self, EventKind::KeyDown | EventKind::KeyUp)
    }

    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            EventKind::FingerDown | EventKind::FingerUp | EventKind::FingerMotion
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = LineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| LineError::UnknownKind {
                line: 0,
                token: s.to_string(),
            })
    }
}

/// One logged input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Microseconds since the recording session started.
    pub timestamp_us: u64,
    pub kind: EventKind,
    /// Window-relative pixel coordinates, zero for key events.
    pub x: i32,
    pub y: i32,
    /// Button id, key code or finger id depending on `kind`.
    pub code: i64,
    /// Active modifier bitmask, zero where it does not apply.
    pub modifiers: u32,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {:#x}",
            self.timestamp_us, self.kind, self.x, self.y, self.code, self.modifiers
        )
    }
}

impl FromStr for LogEntry {
    type Err = LineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != FIELD_COUNT {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                FIELD_COUNT,
                fields.len()
            )));
        }

        // Numeric fields are checked before the kind so a garbled line is
        // reported as malformed rather than as an unknown kind.
        let timestamp_us = parse_number::<u64>("timestamp", fields[0])?;
        let x = parse_number::<i32>("x", fields[2])?;
        let y = parse_number::<i32>("y", fields[3])?;
        let code = parse_number::<i64>("code", fields[4])?;
        let modifiers = parse_hex(fields[5])?;
        let kind = fields[1].parse::<EventKind>()?;

        Ok(LogEntry {
            timestamp_us,
            kind,
            x,
            y,
            code,
            modifiers,
        })
    }
}

fn malformed(reason: String) -> LineError {
    LineError::Malformed { line: 0, reason }
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> std::result::Result<T, LineError> {
    value
        .parse::<T>()
        .map_err(|_| malformed(format!("invalid {} `{}`", field, value)))
}

fn parse_hex(value: &str) -> std::result::Result<u32, LineError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(digits, 16)
        .map_err(|_| malformed(format!("invalid modifiers `{}`", value)))
}

/// Check if a line carries no record (comment or blank).
pub fn is_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Parse one log line.
///
/// Returns `Ok(None)` for comments and blank lines, wherever they appear.
pub fn parse_line(line: &str) -> std::result::Result<Option<LogEntry>, LineError> {
    if is_comment(line) {
        return Ok(None);
    }
    line.trim().parse().map(Some)
}

/// Write the fixed three-line preamble.
pub fn write_header<W: Write>(sink: &mut W) -> std::io::Result<()> {
    writeln!(sink, "{}", HEADER_TITLE)?;
    writeln!(sink, "{}", HEADER_COLUMNS)?;
    writeln!(sink, "{}", HEADER_RULE)
}

/// Write one record followed by a newline.
pub fn write_entry<W: Write>(sink: &mut W, entry: &LogEntry) -> std::io::Result<()> {
    writeln!(sink, "{}", entry)
}

pub fn write_trailer<W: Write>(sink: &mut W) -> std::io::Result<()> {
    writeln!(sink, "{}", TRAILER)
}

/// Line-by-line reader over a log.
///
/// The header is validated on construction; afterwards the reader yields
/// every record line, skipping comments.
pub struct LogReader<R> {
    source: R,
    line_number: usize,
    buf: Vec<u8>,
    exhausted: bool,
}

impl<R: BufRead> LogReader<R> {
    /// Wrap `source` and consume the title line.
    pub fn new(mut source: R) -> Result<Self> {
        let mut first = Vec::new();
        let read = source.read_until(b'\n', &mut first)?;
        if read == 0 {
            return Err(Error::MalformedHeader("log is empty".to_string()));
        }

        let first = String::from_utf8_lossy(&first);
        let title = first.trim_end_matches(['\r', '\n']);
        if title.trim() != HEADER_TITLE {
            return Err(Error::MalformedHeader(format!(
                "expected `{}`, found `{}`",
                HEADER_TITLE, title
            )));
        }

        Ok(Self {
            source,
            line_number: 1,
            buf: Vec::new(),
            exhausted: false,
        })
    }

    /// Number of the last line read (1-based).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Check if the end of the input has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` at end of input. Per-line failures come back as the
    /// inner `Err` so the caller can skip them and keep reading.
    pub fn next_entry(&mut self) -> Result<Option<std::result::Result<LogEntry, LineError>>> {
        if self.exhausted {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            let read = self.source.read_until(b'\n', &mut self.buf)?;
            if read == 0 {
                self.exhausted = true;
                return Ok(None);
            }
            self.line_number += 1;

            let Ok(line) = std::str::from_utf8(&self.buf) else {
                return Ok(Some(Err(LineError::Malformed {
                    line: self.line_number,
                    reason: "invalid UTF-8".to_string(),
                })));
            };

            match parse_line(line) {
                Ok(None) => continue,
                Ok(Some(entry)) => return Ok(Some(Ok(entry))),
                Err(err) => return Ok(Some(Err(err.with_line(self.line_number)))),
            }
        }
    }
}

/// Aggregate view of a log, used for inspection and validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LogSummary {
    pub entries: usize,
    pub by_kind: BTreeMap<EventKind, usize>,
    pub malformed_lines: Vec<usize>,
    pub unknown_kind_lines: Vec<usize>,
    /// Lines whose timestamp is not strictly greater than the previous record's.
    pub ordering_violations: Vec<usize>,
    pub first_timestamp_us: Option<u64>,
    pub last_timestamp_us: Option<u64>,
}

impl LogSummary {
    /// Span between the first and last record.
    pub fn duration_us(&self) -> u64 {
        match (self.first_timestamp_us, self.last_timestamp_us) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => 0,
        }
    }

    /// Check if every line parsed and timestamps are strictly increasing.
    pub fn is_clean(&self) -> bool {
        self.malformed_lines.is_empty()
            && self.unknown_kind_lines.is_empty()
            && self.ordering_violations.is_empty()
    }
}

/// Scan a whole log.
pub fn summarize<R: BufRead>(reader: &mut LogReader<R>) -> Result<LogSummary> {
    let mut summary = LogSummary::default();

    while let Some(record) = reader.next_entry()? {
        match record {
            Ok(entry) => {
                if let Some(last) = summary.last_timestamp_us {
                    if entry.timestamp_us <= last {
                        summary.ordering_violations.push(reader.line_number());
                    }
                }
                summary.entries += 1;
                *summary.by_kind.entry(entry.kind).or_insert(0) += 1;
                summary.first_timestamp_us.get_or_insert(entry.timestamp_us);
                summary.last_timestamp_us = Some(entry.timestamp_us);
            }
            Err(LineError::Malformed { line, .. }) => summary.malformed_lines.push(line),
            Err(LineError::UnknownKind { line, .. }) => summary.unknown_kind_lines.push(line),
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn entry(timestamp_us: u64, kind: EventKind, x: i32, y: i32, code: i64) -> LogEntry {
        LogEntry {
            timestamp_us,
            kind,
            x,
            y,
            code,
            modifiers: 0,
        }
    }

    #[test]
    fn test_format_entry() {
        let line = entry(5_000, EventKind::MouseMotion, 15, 25, 0).to_string();
        assert_eq!(line, "5000 MOUSE_MOTION 15 25 0 0x0");

        let key = LogEntry {
            modifiers: 0x1c1,
            ..entry(12, EventKind::KeyDown, 0, 0, 97)
        };
        assert_eq!(key.to_string(), "12 KEY_DOWN 0 0 97 0x1c1");
    }

    #[test]
    fn test_parse_entry() {
        let parsed: LogEntry = "9000 MOUSE_UP 15 25 1 0x0".parse().unwrap();
        assert_eq!(parsed, entry(9_000, EventKind::MouseUp, 15, 25, 1));

        let key: LogEntry = "7 KEY_UP 0 0 1073741906 0X40".parse().unwrap();
        assert_eq!(key.code, 1_073_741_906);
        assert_eq!(key.modifiers, 0x40);
    }

    #[test]
    fn test_parse_negative_coordinates() {
        let parsed: LogEntry = "1 MOUSE_MOTION -4 -12 0 0x0".parse().unwrap();
        assert_eq!((parsed.x, parsed.y), (-4, -12));
    }

    #[test]
    fn test_parse_wrong_field_count() {
        let err = "1 MOUSE_DOWN 10 20 1".parse::<LogEntry>().unwrap_err();
        assert!(matches!(err, LineError::Malformed { .. }));

        let err = "1 MOUSE_DOWN 10 20 1 0x0 extra"
            .parse::<LogEntry>()
            .unwrap_err();
        assert!(matches!(err, LineError::Malformed { .. }));
    }

    #[test]
    fn test_parse_bad_number() {
        let err = "abc MOUSE_DOWN 10 20 1 0x0".parse::<LogEntry>().unwrap_err();
        assert!(matches!(err, LineError::Malformed { .. }));

        let err = "1 MOUSE_DOWN 10 20 1 0xzz".parse::<LogEntry>().unwrap_err();
        assert!(matches!(err, LineError::Malformed { .. }));
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = "1 MOUSE_WHEEL 10 20 1 0x0".parse::<LogEntry>().unwrap_err();
        assert_eq!(
            err,
            LineError::UnknownKind {
                line: 0,
                token: "MOUSE_WHEEL".to_string()
            }
        );
    }

    #[test]
    fn test_parse_line_skips_comments() {
        assert_eq!(parse_line("# anything at all"), Ok(None));
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("  # indented comment"), Ok(None));
        assert!(parse_line("0 KEY_DOWN 0 0 13 0x0\n").unwrap().is_some());
    }

    #[test]
    fn test_header_and_trailer() {
        let mut out = Vec::new();
        write_header(&mut out).unwrap();
        write_entry(&mut out, &entry(0, EventKind::MouseDown, 10, 20, 1)).unwrap();
        write_trailer(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "# Scrcpy Event Log\n\
             # Timestamp Type X Y KeyCode Modifiers\n\
             # ----------------------------------------\n\
             0 MOUSE_DOWN 10 20 1 0x0\n\
             # End of log\n"
        );
    }

    #[test]
    fn test_reader_rejects_missing_header() {
        let err = LogReader::new(Cursor::new("")).err().unwrap();
        assert!(matches!(err, Error::MalformedHeader(_)));

        let err = LogReader::new(Cursor::new("0 MOUSE_DOWN 1 1 1 0x0\n"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::MalformedHeader(_)));
    }

    #[test]
    fn test_reader_tolerates_comments_anywhere() {
        let log = "# Scrcpy Event Log\r\n\
                   0 MOUSE_DOWN 10 20 1 0x0\n\
                   # a note in the middle\n\
                   \n\
                   5 MOUSE_UP 10 20 1 0x0\n";
        let mut reader = LogReader::new(Cursor::new(log)).unwrap();

        let first = reader.next_entry().unwrap().unwrap().unwrap();
        assert_eq!(first.kind, EventKind::MouseDown);
        let second = reader.next_entry().unwrap().unwrap().unwrap();
        assert_eq!(second.kind, EventKind::MouseUp);
        assert_eq!(reader.line_number(), 5);
        assert!(reader.next_entry().unwrap().is_none());
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_reader_reports_line_numbers() {
        let log = "# Scrcpy Event Log\n# cols\n0 MOUSE_DOWN 10 20 1 0x0\ngarbage\n";
        let mut reader = LogReader::new(Cursor::new(log)).unwrap();
        assert!(reader.next_entry().unwrap().unwrap().is_ok());
        let err = reader.next_entry().unwrap().unwrap().unwrap_err();
        assert_eq!(err.line(), 4);
    }

    #[test]
    fn test_reader_skips_invalid_utf8_line() {
        let mut log = b"# Scrcpy Event Log\n0 MOUSE_DOWN 10 20 1 0x0\n".to_vec();
        log.extend_from_slice(b"1000 MOUSE_MOTION \xff\xfe 22 0 0x0\n");
        log.extend_from_slice(b"2000 MOUSE_UP 10 20 1 0x0\n");
        let mut reader = LogReader::new(Cursor::new(log)).unwrap();

        assert!(reader.next_entry().unwrap().unwrap().is_ok());
        let err = reader.next_entry().unwrap().unwrap().unwrap_err();
        assert_eq!(
            err,
            LineError::Malformed {
                line: 3,
                reason: "invalid UTF-8".to_string()
            }
        );
        let last = reader.next_entry().unwrap().unwrap().unwrap();
        assert_eq!(last.kind, EventKind::MouseUp);
        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_summarize() {
        let log = "# Scrcpy Event Log\n\
                   # Timestamp Type X Y KeyCode Modifiers\n\
                   # ----------------------------------------\n\
                   0 MOUSE_DOWN 10 20 1 0x0\n\
                   5000 MOUSE_MOTION 15 25 0 0x0\n\
                   5000 MOUSE_MOTION 16 25 0 0x0\n\
                   not a record\n\
                   8000 SCROLL 0 0 0 0x0\n\
                   9000 MOUSE_UP 15 25 1 0x0\n\
                   # End of log\n";
        let mut reader = LogReader::new(Cursor::new(log)).unwrap();
        let summary = summarize(&mut reader).unwrap();

        assert_eq!(summary.entries, 4);
        assert_eq!(summary.by_kind[&EventKind::MouseMotion], 2);
        assert_eq!(summary.malformed_lines, vec![7]);
        assert_eq!(summary.unknown_kind_lines, vec![8]);
        assert_eq!(summary.ordering_violations, vec![6]);
        assert_eq!(summary.duration_us(), 9_000);
        assert!(!summary.is_clean());
    }
}
