//! Line parser for shell command history files.
//!
//! Two formats share one file, dispatched on the first non-whitespace
//! character:
//!
//! - JSON lines: `{"timestamp": "2025-01-15T10:30:45", "user": "u",
//!   "directory": "~/p", "command": "ls"}`
//! - Plain text: `2025-01-15 10:30:45 [u] ~/p: ls`
//!
//! Lines in neither format are skipped, never fatal.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

/// A parsed history line, independent of input format. The `date` and `time`
/// strings are always derived from `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCommand {
    pub timestamp: NaiveDateTime,
    pub date: String,
    pub time: String,
    pub user: String,
    pub directory: String,
    pub command: String,
    /// Original input text, preserved verbatim (trimmed).
    pub raw_line: String,
}

#[allow(clippy::unwrap_used)] // fixed pattern, compiles
static TEXT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})\s+(\d{2}:\d{2}:\d{2})\s+\[([^\]]+)\]\s+(.*?):\s+(.+)$")
        .unwrap()
});

/// Parse one line from a history file. Returns `None` for blank lines and
/// anything that matches neither format; malformed JSON lines additionally
/// log a warning so skipped data stays visible.
pub fn parse_line(line: &str) -> Option<NormalizedCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with('{') {
        return parse_json_line(line);
    }
    parse_text_line(line)
}

fn parse_json_line(line: &str) -> Option<NormalizedCommand> {
    let data: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("[tracer] skipping malformed JSON line: {e}");
            return None;
        }
    };

    // Timestamp resolution order: ISO `timestamp` field, then `date` + `time`,
    // then the current wall clock. A non-string `timestamp` falls through to
    // the next source rather than failing the line.
    let timestamp = if let Some(ts) = data.get("timestamp").and_then(Value::as_str) {
        match parse_iso_timestamp(ts) {
            Some(t) => t,
            None => {
                eprintln!("[tracer] skipping line with bad timestamp: {ts}");
                return None;
            }
        }
    } else if let (Some(date), Some(time)) = (
        data.get("date").and_then(Value::as_str),
        data.get("time").and_then(Value::as_str),
    ) {
        match NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S") {
            Ok(t) => t,
            Err(e) => {
                eprintln!("[tracer] skipping line with bad date/time: {e}");
                return None;
            }
        }
    } else {
        Local::now().naive_local()
    };

    let field = |primary: &str, fallback: &str| {
        data.get(primary)
            .and_then(Value::as_str)
            .or_else(|| data.get(fallback).and_then(Value::as_str))
    };

    Some(NormalizedCommand {
        timestamp,
        date: timestamp.format("%Y-%m-%d").to_string(),
        time: timestamp.format("%H:%M:%S").to_string(),
        user: field("user", "username").unwrap_or("unknown").to_string(),
        directory: field("directory", "cwd").unwrap_or("").to_string(),
        command: data
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        raw_line: line.to_string(),
    })
}

/// Accepts RFC 3339 (`2025-01-27T09:15:22Z`, offsets allowed) and offset-free
/// ISO (`2025-01-15T10:30:45`). The local clock fields are kept as written;
/// an offset is not applied as a shift.
fn parse_iso_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

fn parse_text_line(line: &str) -> Option<NormalizedCommand> {
    let caps = TEXT_LINE.captures(line)?;
    let date = &caps[1];
    let time = &caps[2];
    let timestamp =
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").ok()?;
    Some(NormalizedCommand {
        timestamp,
        date: date.to_string(),
        time: time.to_string(),
        user: caps[3].to_string(),
        directory: caps[4].to_string(),
        command: caps[5].to_string(),
        raw_line: line.to_string(),
    })
}

#[cfg(test)]
mod tests;
