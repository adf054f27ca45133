use std::path::Path;

use rusqlite::Connection;

use tracer::ingest;

pub fn cmd_ingest(conn: &mut Connection, file: &str, batch_size: usize) -> i32 {
    match ingest::ingest_file(conn, Path::new(file), batch_size) {
        Ok(inserted) => {
            println!("{inserted} new records from {file}");
            0
        }
        Err(e) => {
            eprintln!("[tracer] error: {e}");
            1
        }
    }
}
