use chrono::{Local, TimeZone};
use dual_logger::rotation::{daily_file_name, RotatingFile};
use std::fs;

#[test]
fn test_file_name_embeds_local_date() {
    let now = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(
        daily_file_name("/var/log/app", now).to_str(),
        Some("/var/log/app-20260102.log")
    );
}

#[test]
fn test_rotation_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("svc");
    let prefix = prefix.to_str().unwrap();
    let before = Local.with_ymd_and_hms(2026, 3, 14, 23, 59, 58).unwrap();
    let after = Local.with_ymd_and_hms(2026, 3, 15, 0, 0, 2).unwrap();

    let mut file = RotatingFile::new();
    let opened = file.ensure_rotated(prefix, before).unwrap().map(|p| p.to_path_buf());
    assert_eq!(opened, Some(daily_file_name(prefix, before)));
    assert_eq!(
        file.next_rotation(),
        Some(Local.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap())
    );
    file.write_line("late\n").unwrap();

    // Still the same day a second later.
    let almost = Local.with_ymd_and_hms(2026, 3, 14, 23, 59, 59).unwrap();
    assert!(file.ensure_rotated(prefix, almost).unwrap().is_none());

    let reopened = file.ensure_rotated(prefix, after).unwrap().map(|p| p.to_path_buf());
    assert_eq!(reopened, Some(daily_file_name(prefix, after)));
    assert_eq!(file.closed_count(), 1);
    file.write_line("early\n").unwrap();

    // Further writes on the new day keep the handle.
    let later = Local.with_ymd_and_hms(2026, 3, 15, 13, 0, 0).unwrap();
    assert!(file.ensure_rotated(prefix, later).unwrap().is_none());
    assert_eq!(file.closed_count(), 1);

    file.sync().unwrap();
    assert_eq!(fs::read_to_string(daily_file_name(prefix, before)).unwrap(), "late\n");
    assert_eq!(fs::read_to_string(daily_file_name(prefix, after)).unwrap(), "early\n");
}

#[test]
fn test_reopen_appends_to_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("svc");
    let prefix = prefix.to_str().unwrap();
    let now = Local.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();

    let mut file = RotatingFile::new();
    file.ensure_rotated(prefix, now).unwrap();
    file.write_line("one\n").unwrap();
    file.close();

    file.ensure_rotated(prefix, now).unwrap();
    file.write_line("two\n").unwrap();
    file.close();

    assert_eq!(file.closed_count(), 2);
    assert_eq!(fs::read_to_string(daily_file_name(prefix, now)).unwrap(), "one\ntwo\n");
}

#[cfg(unix)]
#[test]
fn test_new_file_is_shared_access() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("svc");
    let prefix = prefix.to_str().unwrap();
    let now = Local.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();

    let mut file = RotatingFile::new();
    file.ensure_rotated(prefix, now).unwrap();

    // The process umask still applies; owner access is all that is certain.
    let mode = fs::metadata(daily_file_name(prefix, now)).unwrap().permissions().mode();
    assert_eq!(mode & 0o700, 0o700);
}
