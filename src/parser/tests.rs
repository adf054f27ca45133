use super::*;

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("timestamp")
}

// --- blank input ---

#[test]
fn empty_line_skipped() {
    assert!(parse_line("").is_none());
}

#[test]
fn whitespace_only_line_skipped() {
    assert!(parse_line("   \t  ").is_none());
}

// --- JSON lines ---

#[test]
fn json_line_with_utc_timestamp() {
    let p = parse_line(r#"{"timestamp":"2025-01-27T09:15:22Z","user":"john","command":"ls -la"}"#)
        .expect("parsed");
    assert_eq!(p.user, "john");
    assert_eq!(p.command, "ls -la");
    assert_eq!(p.date, "2025-01-27");
    assert_eq!(p.time, "09:15:22");
    assert_eq!(p.directory, "");
    assert_eq!(p.timestamp, ts("2025-01-27 09:15:22"));
}

#[test]
fn json_line_offset_free_timestamp() {
    let p = parse_line(r#"{"timestamp":"2025-01-15T10:30:45","user":"u","command":"ls"}"#)
        .expect("parsed");
    assert_eq!(p.timestamp, ts("2025-01-15 10:30:45"));
}

#[test]
fn json_line_offset_keeps_clock_fields() {
    let p = parse_line(r#"{"timestamp":"2025-01-15T10:30:45+02:00","command":"ls"}"#)
        .expect("parsed");
    assert_eq!(p.time, "10:30:45");
}

#[test]
fn json_line_fractional_seconds() {
    let p = parse_line(r#"{"timestamp":"2025-01-27T09:15:22.500Z","command":"ls"}"#)
        .expect("parsed");
    assert_eq!(p.time, "09:15:22");
    assert_eq!(p.timestamp.and_utc().timestamp_subsec_millis(), 500);
}

#[test]
fn json_line_date_and_time_fields() {
    let p = parse_line(r#"{"date":"2025-03-01","time":"08:00:09","user":"ana","command":"pwd"}"#)
        .expect("parsed");
    assert_eq!(p.timestamp, ts("2025-03-01 08:00:09"));
    assert_eq!(p.date, "2025-03-01");
    assert_eq!(p.time, "08:00:09");
}

#[test]
fn json_line_timestamp_wins_over_date_time() {
    let p = parse_line(
        r#"{"timestamp":"2025-01-27T09:15:22Z","date":"1999-01-01","time":"00:00:00"}"#,
    )
    .expect("parsed");
    assert_eq!(p.date, "2025-01-27");
    assert_eq!(p.time, "09:15:22");
}

#[test]
fn json_line_non_string_timestamp_falls_back_to_date_time() {
    let p = parse_line(r#"{"timestamp":1737969322,"date":"2025-01-27","time":"09:15:22"}"#)
        .expect("parsed");
    assert_eq!(p.timestamp, ts("2025-01-27 09:15:22"));
}

#[test]
fn json_line_without_timestamp_uses_wall_clock() {
    let p = parse_line(r#"{"user":"john","command":"ls"}"#).expect("parsed");
    let age = Local::now().naive_local() - p.timestamp;
    assert!(age.num_seconds().abs() < 60, "timestamp not near now: {}", p.timestamp);
    assert_eq!(p.date, p.timestamp.format("%Y-%m-%d").to_string());
    assert_eq!(p.time, p.timestamp.format("%H:%M:%S").to_string());
}

#[test]
fn json_line_username_fallback() {
    let p = parse_line(r#"{"timestamp":"2025-01-27T09:15:22Z","username":"kim"}"#)
        .expect("parsed");
    assert_eq!(p.user, "kim");
}

#[test]
fn json_line_user_wins_over_username() {
    let p = parse_line(r#"{"timestamp":"2025-01-27T09:15:22Z","user":"a","username":"b"}"#)
        .expect("parsed");
    assert_eq!(p.user, "a");
}

#[test]
fn json_line_cwd_fallback() {
    let p = parse_line(r#"{"timestamp":"2025-01-27T09:15:22Z","cwd":"/tmp"}"#).expect("parsed");
    assert_eq!(p.directory, "/tmp");
}

#[test]
fn json_line_missing_fields_use_defaults() {
    let p = parse_line(r#"{"timestamp":"2025-01-27T09:15:22Z"}"#).expect("parsed");
    assert_eq!(p.user, "unknown");
    assert_eq!(p.directory, "");
    assert_eq!(p.command, "");
}

#[test]
fn json_line_raw_preserved() {
    let line = r#"{"timestamp":"2025-01-27T09:15:22Z","command":"ls"}"#;
    let p = parse_line(line).expect("parsed");
    assert_eq!(p.raw_line, line);
}

#[test]
fn malformed_json_returns_none() {
    assert!(parse_line(r#"{"timestamp": "#).is_none());
}

#[test]
fn json_line_bad_timestamp_returns_none() {
    assert!(parse_line(r#"{"timestamp":"not-a-date","command":"ls"}"#).is_none());
}

#[test]
fn json_line_bad_date_time_returns_none() {
    assert!(parse_line(r#"{"date":"2025-99-99","time":"08:00:00"}"#).is_none());
}

// --- plain text lines ---

#[test]
fn text_line_parses_all_fields() {
    let line = "2025-01-27 09:15:22 [john] /home/john: ls -la";
    let p = parse_line(line).expect("parsed");
    assert_eq!(p.timestamp, ts("2025-01-27 09:15:22"));
    assert_eq!(p.date, "2025-01-27");
    assert_eq!(p.time, "09:15:22");
    assert_eq!(p.user, "john");
    assert_eq!(p.directory, "/home/john");
    assert_eq!(p.command, "ls -la");
    assert_eq!(p.raw_line, line);
}

/// The two formats normalize identical data to identical fields.
#[test]
fn text_and_json_lines_normalize_alike() {
    let from_json =
        parse_line(r#"{"timestamp":"2025-01-27T09:15:22Z","user":"john","directory":"/home/john","command":"ls -la"}"#)
            .expect("json");
    let from_text = parse_line("2025-01-27 09:15:22 [john] /home/john: ls -la").expect("text");
    assert_eq!(from_json.timestamp, from_text.timestamp);
    assert_eq!(from_json.user, from_text.user);
    assert_eq!(from_json.directory, from_text.directory);
    assert_eq!(from_json.command, from_text.command);
}

#[test]
fn text_line_directory_may_contain_colon() {
    let p = parse_line("2025-01-27 09:15:22 [u] C:/work: dir").expect("parsed");
    assert_eq!(p.directory, "C:/work");
    assert_eq!(p.command, "dir");
}

#[test]
fn text_line_surrounding_whitespace_trimmed() {
    let p = parse_line("  2025-01-27 09:15:22 [u] /tmp: ls  ").expect("parsed");
    assert_eq!(p.raw_line, "2025-01-27 09:15:22 [u] /tmp: ls");
}

#[test]
fn text_line_invalid_calendar_date_returns_none() {
    assert!(parse_line("2025-13-40 09:15:22 [u] /tmp: ls").is_none());
}

#[test]
fn garbage_returns_none() {
    assert!(parse_line("garbage text").is_none());
}

#[test]
fn text_line_without_user_brackets_returns_none() {
    assert!(parse_line("2025-01-27 09:15:22 /home/john: ls").is_none());
}
