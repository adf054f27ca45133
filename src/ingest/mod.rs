//! Batch ingestion of command history files.
//!
//! Streams a file line by line, normalizes each line via the parser,
//! discards duplicates already in the store, and flushes inserts in
//! transactional batches. One ingestion run is assumed to be active at a
//! time; the dedup probe is not atomic against a concurrent run on the same
//! database.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::Duration;
use rusqlite::Connection;

use crate::error::TracerError;
use crate::parser::{self, NormalizedCommand};
use crate::store;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Load command history lines from `path` into the store, returning the
/// number of newly inserted records. Unparsable lines and duplicates are
/// skipped; re-ingesting an identical file inserts nothing.
///
/// # Errors
/// Returns an error if `batch_size` is zero, the file cannot be opened or
/// read, or a batch flush fails. Per-line parse and dedup failures never
/// abort the run.
pub fn ingest_file(
    conn: &mut Connection,
    path: &Path,
    batch_size: usize,
) -> Result<usize, TracerError> {
    if batch_size == 0 {
        return Err(TracerError::validation("batch_size", "must be at least 1"));
    }

    let file = File::open(path).map_err(|e| TracerError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut batch: Vec<NormalizedCommand> = Vec::new();
    let mut inserted = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| TracerError::io(path, e))?;
        let Some(cmd) = parser::parse_line(&line) else {
            continue;
        };
        match is_duplicate(conn, &cmd) {
            Ok(true) => {}
            Ok(false) => {
                batch.push(cmd);
                if batch.len() >= batch_size {
                    inserted += flush(conn, &batch)?;
                    batch.clear();
                }
            }
            // Per-line isolation: a failed probe skips this line only.
            Err(e) => eprintln!("[tracer] line {}: dedup check failed: {e}", idx + 1),
        }
    }

    if !batch.is_empty() {
        inserted += flush(conn, &batch)?;
    }
    Ok(inserted)
}

/// A candidate duplicates a stored record when user and command match and the
/// stored timestamp lies within ±1s (inclusive) of the candidate's. Indexed
/// range probe on (user, command, timestamp); text comparison is valid
/// because the stored format orders lexically.
fn is_duplicate(conn: &Connection, cmd: &NormalizedCommand) -> Result<bool, TracerError> {
    let from = store::ts_text(cmd.timestamp - Duration::seconds(1));
    let to = store::ts_text(cmd.timestamp + Duration::seconds(1));
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM command_logs
         WHERE user = ?1 AND command = ?2 AND timestamp BETWEEN ?3 AND ?4",
        rusqlite::params![cmd.user, cmd.command, from, to],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

/// Persist one batch atomically, preserving file order.
fn flush(conn: &mut Connection, batch: &[NormalizedCommand]) -> Result<usize, TracerError> {
    let tx = conn.transaction()?;
    for cmd in batch {
        store::insert_command_log(&tx, cmd)?;
    }
    tx.commit()?;
    Ok(batch.len())
}
