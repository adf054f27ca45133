use rusqlite::Connection;

use tracer::folders;
use tracer::store::WatchFolder;

fn print_folder(folder: &WatchFolder) {
    let active = if folder.is_active { "active" } else { "paused" };
    let recursive = if folder.recursive { "recursive" } else { "flat" };
    let patterns = folder.file_patterns.as_deref().unwrap_or("*");
    println!(
        "{} {:7} {:9} [{}] {}",
        folder.id, active, recursive, patterns, folder.path
    );
}

pub fn cmd_folders_ls(conn: &Connection, json: bool) -> i32 {
    match folders::list_folders(conn) {
        Ok(list) => {
            if json {
                crate::output::print_json(&list);
                return 0;
            }
            if list.is_empty() {
                eprintln!("[tracer] no folders registered");
                return 0;
            }
            for folder in &list {
                print_folder(folder);
            }
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}

pub fn cmd_folders_add(
    conn: &Connection,
    path: &str,
    patterns: Option<&str>,
    recursive: bool,
    json: bool,
) -> i32 {
    match folders::add_folder(conn, path, patterns, recursive) {
        Ok(folder) => {
            if json {
                crate::output::print_json(&folder);
            } else {
                eprintln!("[tracer] watching {} (id {})", folder.path, folder.id);
            }
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}

pub fn cmd_folders_rm(conn: &Connection, id: i64) -> i32 {
    match folders::remove_folder(conn, id) {
        Ok(()) => {
            eprintln!("[tracer] removed folder {id}");
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}

pub fn cmd_folders_toggle(conn: &Connection, id: i64) -> i32 {
    match folders::toggle_folder(conn, id) {
        Ok(folder) => {
            let state = if folder.is_active { "active" } else { "paused" };
            eprintln!("[tracer] folder {} is now {state}", folder.id);
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}
