//! Filtered, paginated, and aggregated views over the two event streams.
//!
//! Filtering, ordering, and pagination are pushed down to SQL. Containment
//! filters use `instr()` rather than `LIKE` because `LIKE` is
//! case-insensitive for ASCII in SQLite and these filters are case-sensitive.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use rusqlite::types::ToSql;
use serde::Serialize;

use crate::error::TracerError;
use crate::store::{self, CommandLog, FileChange};

/// Filters and pagination for the command log stream. All filters are
/// optional; dates are `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user: Option<String>,
    /// Case-sensitive substring of the command text.
    pub search: Option<String>,
    /// Case-sensitive substring of the directory.
    pub directory: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// Filters and pagination for the file change stream.
#[derive(Debug, Clone, Default)]
pub struct ChangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub event_type: Option<String>,
    pub file_extension: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// One page of a filtered result set. `total` counts the whole filtered set,
/// not the page.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub total: i64,
    pub limit: usize,
    pub offset: usize,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct LogStats {
    pub total_logs: i64,
    pub first_log: Option<NaiveDateTime>,
    pub last_log: Option<NaiveDateTime>,
    pub unique_users: i64,
    pub most_active_user: Option<ValueCount>,
    /// Ranked by count; the displayed command text is truncated to 50
    /// characters, the grouping key is not.
    pub top_commands: Vec<ValueCount>,
}

#[derive(Debug, Serialize)]
pub struct ChangeStats {
    pub total_changes: i64,
    pub first_change: Option<NaiveDateTime>,
    pub last_change: Option<NaiveDateTime>,
    pub event_types: Vec<ValueCount>,
    /// Rows without an extension are excluded.
    pub top_extensions: Vec<ValueCount>,
    pub top_directories: Vec<ValueCount>,
}

/// Distinct field values, for populating filter controls.
#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub users: Vec<String>,
    pub directories: Vec<String>,
}

/// Display width for command text in top-command rankings.
const COMMAND_DISPLAY_CHARS: usize = 50;

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, TracerError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| TracerError::validation(field, "expected YYYY-MM-DD"))
}

/// Resolve the optional date filters into a half-open `[from, to)` timestamp
/// window: both dates → `[start, end + 1 day)`; start only → `[start, now)`;
/// otherwise no window. Both dates are validated before either is applied, so
/// a malformed end date fails even when it would be ignored.
fn time_window(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<Option<(String, String)>, TracerError> {
    let start = start_date.map(|s| parse_date("start_date", s)).transpose()?;
    let end = end_date.map(|s| parse_date("end_date", s)).transpose()?;
    Ok(match (start, end) {
        (Some(s), Some(e)) => Some((
            store::ts_text(s.and_time(NaiveTime::MIN)),
            store::ts_text((e + Duration::days(1)).and_time(NaiveTime::MIN)),
        )),
        (Some(s), None) => Some((
            store::ts_text(s.and_time(NaiveTime::MIN)),
            store::ts_text(Local::now().naive_local()),
        )),
        _ => None,
    })
}

/// Incrementally assembled WHERE clause with positional `?` placeholders.
struct Filter {
    clauses: Vec<&'static str>,
    params: Vec<Box<dyn ToSql>>,
}

impl Filter {
    fn new() -> Self {
        Self {
            clauses: Vec::new(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, clause: &'static str, value: impl ToSql + 'static) {
        self.clauses.push(clause);
        self.params.push(Box::new(value));
    }

    /// Add a trailing parameter without a clause (LIMIT/OFFSET).
    fn push_param(&mut self, value: impl ToSql + 'static) {
        self.params.push(Box::new(value));
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    fn refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Query command logs: filtered, newest first, paginated. The returned total
/// counts the full filtered set before pagination.
///
/// # Errors
/// Returns a validation error for malformed dates, or an SQL error.
pub fn query_logs(conn: &Connection, q: &LogQuery) -> Result<Page<CommandLog>, TracerError> {
    let mut f = Filter::new();
    if let Some((from, to)) = time_window(q.start_date.as_deref(), q.end_date.as_deref())? {
        f.push("timestamp >= ?", from);
        f.push("timestamp < ?", to);
    }
    if let Some(user) = &q.user {
        f.push("user = ?", user.clone());
    }
    if let Some(dir) = &q.directory {
        f.push("instr(directory, ?) > 0", dir.clone());
    }
    if let Some(search) = &q.search {
        f.push("instr(command, ?) > 0", search.clone());
    }

    let where_sql = f.where_sql();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM command_logs{where_sql}"),
        &f.refs()[..],
        |r| r.get(0),
    )?;

    #[allow(clippy::cast_possible_wrap)]
    let (limit, offset) = (q.limit as i64, q.offset as i64);
    f.push_param(limit);
    f.push_param(offset);
    let sql = format!(
        "SELECT id, timestamp, date, time, user, directory, command, raw_line
         FROM command_logs{where_sql}
         ORDER BY timestamp DESC LIMIT ? OFFSET ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(&f.refs()[..], store::map_command_log)?;
    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(Page {
        total,
        limit: q.limit,
        offset: q.offset,
        items,
    })
}

/// Query file changes: filtered, newest first, paginated. Symmetric with
/// [`query_logs`].
///
/// # Errors
/// Returns a validation error for malformed dates, or an SQL error.
pub fn query_file_changes(
    conn: &Connection,
    q: &ChangeQuery,
) -> Result<Page<FileChange>, TracerError> {
    let mut f = Filter::new();
    if let Some((from, to)) = time_window(q.start_date.as_deref(), q.end_date.as_deref())? {
        f.push("timestamp >= ?", from);
        f.push("timestamp < ?", to);
    }
    if let Some(event_type) = &q.event_type {
        f.push("event_type = ?", event_type.clone());
    }
    if let Some(ext) = &q.file_extension {
        f.push("file_extension = ?", ext.clone());
    }

    let where_sql = f.where_sql();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM file_changes{where_sql}"),
        &f.refs()[..],
        |r| r.get(0),
    )?;

    #[allow(clippy::cast_possible_wrap)]
    let (limit, offset) = (q.limit as i64, q.offset as i64);
    f.push_param(limit);
    f.push_param(offset);
    let sql = format!(
        "SELECT id, timestamp, date, event_type, file_path, directory, file_name,
                file_extension, size, is_directory, src_path, raw_data
         FROM file_changes{where_sql}
         ORDER BY timestamp DESC LIMIT ? OFFSET ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(&f.refs()[..], store::map_file_change)?;
    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(Page {
        total,
        limit: q.limit,
        offset: q.offset,
        items,
    })
}

fn counts_by_date(conn: &Connection, table: &str) -> Result<Vec<DateCount>, TracerError> {
    let sql =
        format!("SELECT date, COUNT(*) FROM {table} GROUP BY date ORDER BY date DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |r| {
        Ok(DateCount {
            date: r.get(0)?,
            count: r.get(1)?,
        })
    })?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Command log counts per date, newest date first.
///
/// # Errors
/// Returns an error if the query fails.
pub fn logs_by_date(conn: &Connection) -> Result<Vec<DateCount>, TracerError> {
    counts_by_date(conn, "command_logs")
}

/// Command log counts per user, most active first.
///
/// # Errors
/// Returns an error if the query fails.
pub fn logs_by_user(conn: &Connection) -> Result<Vec<ValueCount>, TracerError> {
    ranked_counts(
        conn,
        "SELECT user, COUNT(*) AS n FROM command_logs
         GROUP BY user ORDER BY n DESC",
        None,
    )
}

/// File change counts per date, newest date first.
///
/// # Errors
/// Returns an error if the query fails.
pub fn changes_by_date(conn: &Connection) -> Result<Vec<DateCount>, TracerError> {
    counts_by_date(conn, "file_changes")
}

fn parse_bound(value: Option<String>) -> Result<Option<NaiveDateTime>, TracerError> {
    Ok(match value {
        Some(s) => Some(store::ts_from_sql(0, &s)?),
        None => None,
    })
}

fn ranked_counts(
    conn: &Connection,
    sql: &str,
    limit: Option<usize>,
) -> Result<Vec<ValueCount>, TracerError> {
    let mut stmt = conn.prepare(sql)?;
    let map = |r: &rusqlite::Row<'_>| {
        Ok(ValueCount {
            value: r.get(0)?,
            count: r.get(1)?,
        })
    };
    let mut result = Vec::new();
    match limit {
        Some(n) => {
            #[allow(clippy::cast_possible_wrap)]
            let rows = stmt.query_map([n as i64], map)?;
            for row in rows {
                result.push(row?);
            }
        }
        None => {
            let rows = stmt.query_map([], map)?;
            for row in rows {
                result.push(row?);
            }
        }
    }
    Ok(result)
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max).collect()
    } else {
        s.to_string()
    }
}

/// Aggregate statistics over the command log collection. `top` bounds the
/// top-command ranking (callers default to 10).
///
/// # Errors
/// Returns an error if a query fails.
pub fn log_stats(conn: &Connection, top: usize) -> Result<LogStats, TracerError> {
    let total_logs: i64 =
        conn.query_row("SELECT COUNT(*) FROM command_logs", [], |r| r.get(0))?;
    let (first, last): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(timestamp), MAX(timestamp) FROM command_logs",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    let unique_users: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT user) FROM command_logs",
        [],
        |r| r.get(0),
    )?;
    let most_active_user = logs_by_user(conn)?.into_iter().next();
    // Group and count on the full command text, truncate for display after.
    let top_commands = ranked_counts(
        conn,
        "SELECT command, COUNT(*) AS n FROM command_logs
         GROUP BY command ORDER BY n DESC LIMIT ?",
        Some(top),
    )?
    .into_iter()
    .map(|vc| ValueCount {
        value: truncate_chars(&vc.value, COMMAND_DISPLAY_CHARS),
        count: vc.count,
    })
    .collect();

    Ok(LogStats {
        total_logs,
        first_log: parse_bound(first)?,
        last_log: parse_bound(last)?,
        unique_users,
        most_active_user,
        top_commands,
    })
}

/// Aggregate statistics over the file change collection.
///
/// # Errors
/// Returns an error if a query fails.
pub fn change_stats(conn: &Connection, top: usize) -> Result<ChangeStats, TracerError> {
    let total_changes: i64 =
        conn.query_row("SELECT COUNT(*) FROM file_changes", [], |r| r.get(0))?;
    let (first, last): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(timestamp), MAX(timestamp) FROM file_changes",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    let event_types = ranked_counts(
        conn,
        "SELECT event_type, COUNT(*) AS n FROM file_changes
         GROUP BY event_type ORDER BY n DESC",
        None,
    )?;
    let top_extensions = ranked_counts(
        conn,
        "SELECT file_extension, COUNT(*) AS n FROM file_changes
         WHERE file_extension IS NOT NULL
         GROUP BY file_extension ORDER BY n DESC LIMIT ?",
        Some(top),
    )?;
    let top_directories = ranked_counts(
        conn,
        "SELECT directory, COUNT(*) AS n FROM file_changes
         GROUP BY directory ORDER BY n DESC LIMIT ?",
        Some(top),
    )?;

    Ok(ChangeStats {
        total_changes,
        first_change: parse_bound(first)?,
        last_change: parse_bound(last)?,
        event_types,
        top_extensions,
        top_directories,
    })
}

fn distinct_values(conn: &Connection, sql: &str) -> Result<Vec<String>, TracerError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |r| r.get(0))?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Sorted distinct users and directories of the command log stream; empty
/// strings are excluded.
///
/// # Errors
/// Returns an error if a query fails.
pub fn filter_options(conn: &Connection) -> Result<FilterOptions, TracerError> {
    Ok(FilterOptions {
        users: distinct_values(
            conn,
            "SELECT DISTINCT user FROM command_logs WHERE user <> '' ORDER BY user",
        )?,
        directories: distinct_values(
            conn,
            "SELECT DISTINCT directory FROM command_logs WHERE directory <> '' ORDER BY directory",
        )?,
    })
}

fn day_bounds(field: &str, date: &str) -> Result<(String, String), TracerError> {
    let d = parse_date(field, date)?;
    Ok((
        store::ts_text(d.and_time(NaiveTime::MIN)),
        store::ts_text((d + Duration::days(1)).and_time(NaiveTime::MIN)),
    ))
}

/// Every command log of one `YYYY-MM-DD` day, oldest first.
///
/// # Errors
/// Returns a validation error for a malformed date, or an SQL error.
pub fn logs_for_date(conn: &Connection, date: &str) -> Result<Vec<CommandLog>, TracerError> {
    let (from, to) = day_bounds("date", date)?;
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, date, time, user, directory, command, raw_line
         FROM command_logs
         WHERE timestamp >= ?1 AND timestamp < ?2
         ORDER BY timestamp ASC",
    )?;
    let rows = stmt.query_map(rusqlite::params![from, to], store::map_command_log)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Every file change of one `YYYY-MM-DD` day, oldest first.
///
/// # Errors
/// Returns a validation error for a malformed date, or an SQL error.
pub fn changes_for_date(conn: &Connection, date: &str) -> Result<Vec<FileChange>, TracerError> {
    let (from, to) = day_bounds("date", date)?;
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, date, event_type, file_path, directory, file_name,
                file_extension, size, is_directory, src_path, raw_data
         FROM file_changes
         WHERE timestamp >= ?1 AND timestamp < ?2
         ORDER BY timestamp ASC",
    )?;
    let rows = stmt.query_map(rusqlite::params![from, to], store::map_file_change)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Delete one file change record by id.
///
/// # Errors
/// Returns a not-found error when no row has that id.
pub fn delete_file_change(conn: &Connection, id: i64) -> Result<(), TracerError> {
    let n = conn.execute("DELETE FROM file_changes WHERE id = ?1", rusqlite::params![id])?;
    if n == 0 {
        return Err(TracerError::not_found(format!("file change {id}")));
    }
    Ok(())
}
