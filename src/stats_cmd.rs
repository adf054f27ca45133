use rusqlite::Connection;

use tracer::query::{self, ValueCount};

fn print_ranking(label: &str, rows: &[ValueCount]) {
    println!("{label}:");
    for row in rows {
        println!("  {:5}  {}", row.count, row.value);
    }
}

fn fmt_bound(bound: Option<chrono::NaiveDateTime>) -> String {
    bound.map_or_else(|| "-".to_string(), |t| t.to_string())
}

pub fn cmd_log_stats(conn: &Connection, top: usize, json: bool) -> i32 {
    match query::log_stats(conn, top) {
        Ok(stats) => {
            if json {
                crate::output::print_json(&stats);
                return 0;
            }
            println!("command log stats");
            println!("  total logs:    {}", stats.total_logs);
            println!("  first log:     {}", fmt_bound(stats.first_log));
            println!("  last log:      {}", fmt_bound(stats.last_log));
            println!("  unique users:  {}", stats.unique_users);
            match &stats.most_active_user {
                Some(u) => println!("  most active:   {} ({})", u.value, u.count),
                None => println!("  most active:   -"),
            }
            print_ranking("  top commands", &stats.top_commands);
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}

pub fn cmd_change_stats(conn: &Connection, top: usize, json: bool) -> i32 {
    match query::change_stats(conn, top) {
        Ok(stats) => {
            if json {
                crate::output::print_json(&stats);
                return 0;
            }
            println!("file change stats");
            println!("  total changes: {}", stats.total_changes);
            println!("  first change:  {}", fmt_bound(stats.first_change));
            println!("  last change:   {}", fmt_bound(stats.last_change));
            print_ranking("  event types", &stats.event_types);
            print_ranking("  top extensions", &stats.top_extensions);
            print_ranking("  top directories", &stats.top_directories);
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}

fn print_daily(rows: &[query::DateCount], json: bool) -> i32 {
    if json {
        crate::output::print_json(rows);
        return 0;
    }
    for row in rows {
        println!("{}  {}", row.date, row.count);
    }
    0
}

pub fn cmd_logs_by_user(conn: &Connection, json: bool) -> i32 {
    match query::logs_by_user(conn) {
        Ok(rows) => {
            if json {
                crate::output::print_json(&rows);
                return 0;
            }
            for row in &rows {
                println!("  {:5}  {}", row.count, row.value);
            }
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}

pub fn cmd_logs_daily(conn: &Connection, json: bool) -> i32 {
    match query::logs_by_date(conn) {
        Ok(rows) => print_daily(&rows, json),
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}

pub fn cmd_changes_daily(conn: &Connection, json: bool) -> i32 {
    match query::changes_by_date(conn) {
        Ok(rows) => print_daily(&rows, json),
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}
