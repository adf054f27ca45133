use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn tracer(db: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tracer"));
    cmd.env("TRACER_DB_PATH", db);
    cmd
}

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("tracer.db");
    (dir, db)
}

fn write_history(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("history");
    std::fs::write(&path, content).unwrap();
    path
}

const SAMPLE_HISTORY: &str = "\
2025-01-27 09:15:22 [john] /home/john: ls -la
{\"timestamp\":\"2025-01-27T10:00:00Z\",\"user\":\"ana\",\"cwd\":\"/srv\",\"command\":\"git status\"}
garbage text
2025-01-27 11:30:00 [john] /home/john/src: cargo build
";

// --- tracer ingest ---

#[test]
fn ingest_reports_inserted_count() {
    let (dir, db) = setup();
    let history = write_history(&dir, SAMPLE_HISTORY);

    let output = tracer(&db)
        .args(["ingest", history.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("3 new records"),
        "expected count in output, got: {stdout}"
    );
}

#[test]
fn ingest_twice_reports_zero_on_second_run() {
    let (dir, db) = setup();
    let history = write_history(&dir, SAMPLE_HISTORY);

    let first = tracer(&db)
        .args(["ingest", history.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(first.status.success());

    let second = tracer(&db)
        .args(["ingest", history.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(second.status.success());
    let stdout = String::from_utf8_lossy(&second.stdout);
    assert!(
        stdout.contains("0 new records"),
        "expected idempotent re-ingest, got: {stdout}"
    );
}

#[test]
fn ingest_missing_file_exits_one() {
    let (_dir, db) = setup();
    let output = tracer(&db)
        .args(["ingest", "/nonexistent/history"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("[tracer] error"),
        "expected error on stderr, got: {stderr}"
    );
}

// --- tracer logs ---

#[test]
fn logs_lists_ingested_records_newest_first() {
    let (dir, db) = setup();
    let history = write_history(&dir, SAMPLE_HISTORY);
    tracer(&db)
        .args(["ingest", history.to_str().unwrap()])
        .output()
        .unwrap();

    let output = tracer(&db).args(["logs"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let build_pos = stdout.find("cargo build").expect("cargo build listed");
    let ls_pos = stdout.find("ls -la").expect("ls -la listed");
    assert!(build_pos < ls_pos, "expected newest first:\n{stdout}");
}

#[test]
fn logs_filter_by_user() {
    let (dir, db) = setup();
    let history = write_history(&dir, SAMPLE_HISTORY);
    tracer(&db)
        .args(["ingest", history.to_str().unwrap()])
        .output()
        .unwrap();

    let output = tracer(&db).args(["logs", "--user", "ana"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("git status"), "got: {stdout}");
    assert!(!stdout.contains("ls -la"), "got: {stdout}");
}

#[test]
fn logs_json_includes_total() {
    let (dir, db) = setup();
    let history = write_history(&dir, SAMPLE_HISTORY);
    tracer(&db)
        .args(["ingest", history.to_str().unwrap()])
        .output()
        .unwrap();

    let output = tracer(&db).args(["logs", "--json"]).output().unwrap();
    assert!(output.status.success());
    let page: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON page");
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(3));
}

#[test]
fn logs_invalid_date_exits_one() {
    let (_dir, db) = setup();
    let output = tracer(&db)
        .args(["logs", "--start-date", "27-01-2025"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("validation"),
        "expected validation error, got: {stderr}"
    );
}

#[test]
fn logs_for_date_lists_oldest_first() {
    let (dir, db) = setup();
    let history = write_history(&dir, SAMPLE_HISTORY);
    tracer(&db)
        .args(["ingest", history.to_str().unwrap()])
        .output()
        .unwrap();

    let output = tracer(&db)
        .args(["logs", "--date", "2025-01-27"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let ls_pos = stdout.find("ls -la").expect("ls -la listed");
    let build_pos = stdout.find("cargo build").expect("cargo build listed");
    assert!(ls_pos < build_pos, "expected oldest first:\n{stdout}");
}

// --- tracer stats / options ---

#[test]
fn stats_logs_summary() {
    let (dir, db) = setup();
    let history = write_history(&dir, SAMPLE_HISTORY);
    tracer(&db)
        .args(["ingest", history.to_str().unwrap()])
        .output()
        .unwrap();

    let output = tracer(&db).args(["stats", "logs"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("total logs:    3"), "got: {stdout}");
    assert!(stdout.contains("unique users:  2"), "got: {stdout}");
    assert!(stdout.contains("most active:   john (2)"), "got: {stdout}");
}

#[test]
fn stats_logs_daily_counts() {
    let (dir, db) = setup();
    let history = write_history(&dir, SAMPLE_HISTORY);
    tracer(&db)
        .args(["ingest", history.to_str().unwrap()])
        .output()
        .unwrap();

    let output = tracer(&db)
        .args(["stats", "logs", "--daily"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2025-01-27  3"), "got: {stdout}");
}

#[test]
fn options_lists_users_and_directories() {
    let (dir, db) = setup();
    let history = write_history(&dir, SAMPLE_HISTORY);
    tracer(&db)
        .args(["ingest", history.to_str().unwrap()])
        .output()
        .unwrap();

    let output = tracer(&db).args(["options"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ana") && stdout.contains("john"), "got: {stdout}");
    assert!(stdout.contains("/srv"), "got: {stdout}");
}

// --- tracer folders ---

#[test]
fn folders_add_duplicate_conflicts() {
    let (_dir, db) = setup();

    let first = tracer(&db)
        .args(["folders", "add", "/etc/app", "--patterns", "*.yml"])
        .output()
        .unwrap();
    assert!(first.status.success());

    let second = tracer(&db)
        .args(["folders", "add", "/etc/app"])
        .output()
        .unwrap();
    assert!(!second.status.success());
    assert_eq!(second.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("conflict"), "got: {stderr}");
}

#[test]
fn folders_lifecycle_add_toggle_rm() {
    let (_dir, db) = setup();

    tracer(&db)
        .args(["folders", "add", "/srv/data", "--no-recursive"])
        .output()
        .unwrap();

    let list = tracer(&db).args(["folders", "ls"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&list.stdout);
    assert!(stdout.contains("/srv/data"), "got: {stdout}");
    assert!(stdout.contains("active"), "got: {stdout}");
    assert!(stdout.contains("flat"), "got: {stdout}");

    let toggle = tracer(&db).args(["folders", "toggle", "1"]).output().unwrap();
    assert!(toggle.status.success());
    let stderr = String::from_utf8_lossy(&toggle.stderr);
    assert!(stderr.contains("paused"), "got: {stderr}");

    let rm = tracer(&db).args(["folders", "rm", "1"]).output().unwrap();
    assert!(rm.status.success());

    let rm_again = tracer(&db).args(["folders", "rm", "1"]).output().unwrap();
    assert!(!rm_again.status.success());
    let stderr = String::from_utf8_lossy(&rm_again.stderr);
    assert!(stderr.contains("not found"), "got: {stderr}");
}

#[test]
fn folders_ls_empty_exits_zero() {
    let (_dir, db) = setup();
    let output = tracer(&db).args(["folders", "ls"]).output().unwrap();
    assert!(output.status.success());
}
