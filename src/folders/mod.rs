//! Watch folder registry.
//!
//! CRUD over the small set of filesystem paths the external watcher observes.
//! The watcher itself (start/stop/restart of observers) lives outside this
//! crate; it picks registry changes up from the shared database.

use chrono::Local;
use rusqlite::{Connection, OptionalExtension};

use crate::error::TracerError;
use crate::store::{self, WatchFolder};

const FOLDER_COLUMNS: &str =
    "id, path, is_active, file_patterns, recursive, created_at, last_checked";

/// All registered folders.
///
/// # Errors
/// Returns an error if the query fails.
pub fn list_folders(conn: &Connection) -> Result<Vec<WatchFolder>, TracerError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FOLDER_COLUMNS} FROM watch_folders ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([], store::map_watch_folder)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Look up one folder by id.
///
/// # Errors
/// Returns an error if the query fails.
pub fn get_folder(conn: &Connection, id: i64) -> Result<Option<WatchFolder>, TracerError> {
    let folder = conn
        .query_row(
            &format!("SELECT {FOLDER_COLUMNS} FROM watch_folders WHERE id = ?1"),
            rusqlite::params![id],
            store::map_watch_folder,
        )
        .optional()?;
    Ok(folder)
}

/// Register a new folder, active by default. Paths are unique: registering a
/// path that already exists is a conflict and mutates nothing.
///
/// # Errors
/// Returns a conflict error for a duplicate path, or an SQL error.
pub fn add_folder(
    conn: &Connection,
    path: &str,
    file_patterns: Option<&str>,
    recursive: bool,
) -> Result<WatchFolder, TracerError> {
    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM watch_folders WHERE path = ?1",
        rusqlite::params![path],
        |r| r.get(0),
    )?;
    if existing > 0 {
        return Err(TracerError::conflict(format!(
            "path is already being watched: {path}"
        )));
    }

    let created_at = Local::now().naive_local();
    conn.execute(
        "INSERT INTO watch_folders (path, is_active, file_patterns, recursive, created_at)
         VALUES (?1, 'True', ?2, ?3, ?4)",
        rusqlite::params![
            path,
            file_patterns,
            store::bool_text(recursive),
            store::ts_text(created_at),
        ],
    )?;

    Ok(WatchFolder {
        id: conn.last_insert_rowid(),
        path: path.to_string(),
        is_active: true,
        file_patterns: file_patterns.map(ToOwned::to_owned),
        recursive,
        created_at,
        last_checked: None,
    })
}

/// Remove a folder by id.
///
/// # Errors
/// Returns a not-found error when no row has that id.
pub fn remove_folder(conn: &Connection, id: i64) -> Result<(), TracerError> {
    let n = conn.execute(
        "DELETE FROM watch_folders WHERE id = ?1",
        rusqlite::params![id],
    )?;
    if n == 0 {
        return Err(TracerError::not_found(format!("watch folder {id}")));
    }
    Ok(())
}

/// Flip a folder's active flag, returning the updated row.
///
/// # Errors
/// Returns a not-found error when no row has that id.
pub fn toggle_folder(conn: &Connection, id: i64) -> Result<WatchFolder, TracerError> {
    let mut folder = get_folder(conn, id)?
        .ok_or_else(|| TracerError::not_found(format!("watch folder {id}")))?;
    folder.is_active = !folder.is_active;
    conn.execute(
        "UPDATE watch_folders SET is_active = ?1 WHERE id = ?2",
        rusqlite::params![store::bool_text(folder.is_active), id],
    )?;
    Ok(folder)
}
