use rusqlite::Connection;

use tracer::query::{self, ChangeQuery};
use tracer::store::FileChange;

fn print_change(change: &FileChange) {
    let size = change
        .size
        .map_or_else(String::new, |s| format!(" {s}B"));
    let moved_from = change
        .src_path
        .as_deref()
        .map_or_else(String::new, |src| format!(" (from {src})"));
    println!(
        "{} {} {:8} {}{}{}",
        change.id, change.timestamp, change.event_type, change.file_path, size, moved_from
    );
}

pub fn cmd_changes(conn: &Connection, q: &ChangeQuery, json: bool) -> i32 {
    match query::query_file_changes(conn, q) {
        Ok(page) => {
            if json {
                crate::output::print_json(&page);
                return 0;
            }
            if page.items.is_empty() {
                eprintln!("[tracer] no matching changes (total: {})", page.total);
                return 0;
            }
            for change in &page.items {
                print_change(change);
            }
            eprintln!(
                "[tracer] {} of {} (offset {})",
                page.items.len(),
                page.total,
                page.offset
            );
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}

pub fn cmd_changes_for_date(conn: &Connection, date: &str, json: bool) -> i32 {
    match query::changes_for_date(conn, date) {
        Ok(changes) => {
            if json {
                crate::output::print_json(&changes);
                return 0;
            }
            if changes.is_empty() {
                eprintln!("[tracer] no changes on {date}");
                return 0;
            }
            for change in &changes {
                print_change(change);
            }
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}

pub fn cmd_delete_change(conn: &Connection, id: i64) -> i32 {
    match query::delete_file_change(conn, id) {
        Ok(()) => {
            eprintln!("[tracer] deleted change {id}");
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}
