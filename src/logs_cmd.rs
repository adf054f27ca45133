use rusqlite::Connection;

use tracer::query::{self, LogQuery};
use tracer::store::CommandLog;

fn print_log(log: &CommandLog) {
    println!(
        "{} {} {} [{}] {}: {}",
        log.id, log.date, log.time, log.user, log.directory, log.command
    );
}

pub fn cmd_logs(conn: &Connection, q: &LogQuery, json: bool) -> i32 {
    match query::query_logs(conn, q) {
        Ok(page) => {
            if json {
                crate::output::print_json(&page);
                return 0;
            }
            if page.items.is_empty() {
                eprintln!("[tracer] no matching logs (total: {})", page.total);
                return 0;
            }
            for log in &page.items {
                print_log(log);
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

pub fn cmd_logs_for_date(conn: &Connection, date: &str, json: bool) -> i32 {
    match query::logs_for_date(conn, date) {
        Ok(logs) => {
            if json {
                crate::output::print_json(&logs);
                return 0;
            }
            if logs.is_empty() {
                eprintln!("[tracer] no logs on {date}");
                return 0;
            }
            for log in &logs {
                print_log(log);
            }
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}

pub fn cmd_options(conn: &Connection, json: bool) -> i32 {
    match query::filter_options(conn) {
        Ok(options) => {
            if json {
                crate::output::print_json(&options);
                return 0;
            }
            println!("users:");
            for user in &options.users {
                println!("  {user}");
            }
            println!("directories:");
            for dir in &options.directories {
                println!("  {dir}");
            }
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}
