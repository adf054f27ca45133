//! SQLite persistence layer.
//!
//! The database file is shared with the external filesystem watcher, which
//! writes `file_changes` rows directly. Column conventions are therefore part
//! of the external interface: timestamps are text in [`TS_FORMAT`] (lexical
//! order equals chronological order) and boolean columns hold the literal
//! strings `'True'` / `'False'`. Rust-side types carry real `bool`s and
//! [`NaiveDateTime`]s; conversion happens only here.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::error::TracerError;
use crate::parser::NormalizedCommand;

/// Text timestamp format stored in the DB. `%.f` keeps sub-second precision
/// when present and prints nothing for whole seconds, so mixed-precision
/// values still compare correctly as text.
pub const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Returns the DB path: `TRACER_DB_PATH` env var overrides; else
/// `dirs::data_local_dir()/tracer/tracer.db`.
pub fn db_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("TRACER_DB_PATH") {
        return Some(PathBuf::from(p));
    }
    dirs::data_local_dir().map(|d| d.join("tracer").join("tracer.db"))
}

/// Open or create the DB at `path`, creating parent directories and running
/// `CREATE TABLE IF NOT EXISTS` for all three tables.
///
/// # Errors
/// Returns an error if the directory cannot be created or the DB cannot be
/// opened.
pub fn open_db(path: &Path) -> Result<Connection, TracerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| TracerError::io(parent, e))?;
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Initialize the schema on an existing connection.
///
/// # Errors
/// Returns an error if table or index creation fails.
pub fn init_schema(conn: &Connection) -> Result<(), TracerError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS command_logs (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            date      TEXT NOT NULL,
            time      TEXT NOT NULL,
            user      TEXT NOT NULL,
            directory TEXT NOT NULL,
            command   TEXT NOT NULL,
            raw_line  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_command_logs_timestamp
            ON command_logs(timestamp DESC);
        CREATE INDEX IF NOT EXISTS idx_command_logs_date ON command_logs(date);
        CREATE INDEX IF NOT EXISTS idx_command_logs_dedup
            ON command_logs(user, command, timestamp);

        CREATE TABLE IF NOT EXISTS file_changes (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp      TEXT NOT NULL,
            date           TEXT NOT NULL,
            event_type     TEXT NOT NULL,
            file_path      TEXT NOT NULL,
            directory      TEXT NOT NULL,
            file_name      TEXT NOT NULL,
            file_extension TEXT,
            size           INTEGER,
            is_directory   TEXT NOT NULL DEFAULT 'False',
            src_path       TEXT,
            raw_data       TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_file_changes_timestamp
            ON file_changes(timestamp DESC);
        CREATE INDEX IF NOT EXISTS idx_file_changes_date ON file_changes(date);

        CREATE TABLE IF NOT EXISTS watch_folders (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            path          TEXT NOT NULL UNIQUE,
            is_active     TEXT NOT NULL DEFAULT 'True',
            file_patterns TEXT,
            recursive     TEXT NOT NULL DEFAULT 'True',
            created_at    TEXT NOT NULL,
            last_checked  TEXT
        );",
    )?;
    Ok(())
}

/// A persisted command log entry. Never mutated after insert.
#[derive(Debug, Clone, Serialize)]
pub struct CommandLog {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub date: String,
    pub time: String,
    pub user: String,
    pub directory: String,
    pub command: String,
    pub raw_line: String,
}

/// A persisted file change event, as written by the external watcher.
#[derive(Debug, Clone, Serialize)]
pub struct FileChange {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub date: String,
    pub event_type: String,
    pub file_path: String,
    pub directory: String,
    pub file_name: String,
    pub file_extension: Option<String>,
    pub size: Option<i64>,
    pub is_directory: bool,
    /// Original path, populated only for `moved` events.
    pub src_path: Option<String>,
    pub raw_data: Option<String>,
}

/// Parameters for recording one file change. `date` is derived from
/// `timestamp` on insert.
#[derive(Debug, Clone)]
pub struct FileChangeRecord {
    pub timestamp: NaiveDateTime,
    pub event_type: String,
    pub file_path: String,
    pub directory: String,
    pub file_name: String,
    pub file_extension: Option<String>,
    pub size: Option<i64>,
    pub is_directory: bool,
    pub src_path: Option<String>,
    pub raw_data: Option<String>,
}

/// A registered filesystem path of interest, consumed by the external
/// watcher. `last_checked` is written by the watcher and read-only here.
#[derive(Debug, Clone, Serialize)]
pub struct WatchFolder {
    pub id: i64,
    pub path: String,
    pub is_active: bool,
    pub file_patterns: Option<String>,
    pub recursive: bool,
    pub created_at: NaiveDateTime,
    pub last_checked: Option<NaiveDateTime>,
}

pub(crate) fn bool_text(b: bool) -> &'static str {
    if b { "True" } else { "False" }
}

pub(crate) fn text_bool(s: &str) -> bool {
    s == "True"
}

pub(crate) fn ts_text(ts: NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// Parse a stored timestamp column back into a [`NaiveDateTime`], mapping
/// failures onto the rusqlite error type so it can be used inside `query_map`
/// row closures.
pub(crate) fn ts_from_sql(idx: usize, text: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn map_command_log(row: &Row<'_>) -> rusqlite::Result<CommandLog> {
    let ts: String = row.get(1)?;
    Ok(CommandLog {
        id: row.get(0)?,
        timestamp: ts_from_sql(1, &ts)?,
        date: row.get(2)?,
        time: row.get(3)?,
        user: row.get(4)?,
        directory: row.get(5)?,
        command: row.get(6)?,
        raw_line: row.get(7)?,
    })
}

pub(crate) fn map_file_change(row: &Row<'_>) -> rusqlite::Result<FileChange> {
    let ts: String = row.get(1)?;
    let is_directory: String = row.get(9)?;
    Ok(FileChange {
        id: row.get(0)?,
        timestamp: ts_from_sql(1, &ts)?,
        date: row.get(2)?,
        event_type: row.get(3)?,
        file_path: row.get(4)?,
        directory: row.get(5)?,
        file_name: row.get(6)?,
        file_extension: row.get(7)?,
        size: row.get(8)?,
        is_directory: text_bool(&is_directory),
        src_path: row.get(10)?,
        raw_data: row.get(11)?,
    })
}

pub(crate) fn map_watch_folder(row: &Row<'_>) -> rusqlite::Result<WatchFolder> {
    let is_active: String = row.get(2)?;
    let recursive: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    let last_checked: Option<String> = row.get(6)?;
    Ok(WatchFolder {
        id: row.get(0)?,
        path: row.get(1)?,
        is_active: text_bool(&is_active),
        file_patterns: row.get(3)?,
        recursive: text_bool(&recursive),
        created_at: ts_from_sql(5, &created_at)?,
        last_checked: match last_checked {
            Some(t) => Some(ts_from_sql(6, &t)?),
            None => None,
        },
    })
}

/// Insert one parsed command. Date and time columns come straight from the
/// normalized record, which derived them from the timestamp.
///
/// # Errors
/// Returns an error if the INSERT fails.
pub fn insert_command_log(conn: &Connection, cmd: &NormalizedCommand) -> Result<(), TracerError> {
    conn.execute(
        "INSERT INTO command_logs
            (timestamp, date, time, user, directory, command, raw_line)
         VALUES
            (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            ts_text(cmd.timestamp),
            cmd.date,
            cmd.time,
            cmd.user,
            cmd.directory,
            cmd.command,
            cmd.raw_line,
        ],
    )?;
    Ok(())
}

/// Insert one pre-formed file change event and return its id. This is the
/// insertion surface for the external watcher's records; no parsing happens
/// here.
///
/// # Errors
/// Returns an error if the INSERT fails.
pub fn record_file_change(
    conn: &Connection,
    change: &FileChangeRecord,
) -> Result<i64, TracerError> {
    conn.execute(
        "INSERT INTO file_changes
            (timestamp, date, event_type, file_path, directory, file_name,
             file_extension, size, is_directory, src_path, raw_data)
         VALUES
            (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            ts_text(change.timestamp),
            change.timestamp.format("%Y-%m-%d").to_string(),
            change.event_type,
            change.file_path,
            change.directory,
            change.file_name,
            change.file_extension,
            change.size,
            bool_text(change.is_directory),
            change.src_path,
            change.raw_data,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
