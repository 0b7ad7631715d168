use std::fs;
use std::path::Path;

use slogger::{
    Logger, RotationTrigger, new_file_logger, with_buffer_size, with_color, with_compress,
    with_level, with_max_backups, with_max_size, with_rotate_interval,
};

fn read_dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_file_logging_disables_ansi_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("app.log");

    let logger = new_file_logger(&path, [with_max_size(1 << 20), with_color(true)])
        .expect("file logger");
    logger.info(format_args!("file-logging-test: no-ansi"));
    drop(logger);

    let s = fs::read_to_string(&path).expect("read log file");
    assert!(s.contains("[INFO]"));
    assert!(s.contains("file-logging-test: no-ansi"));
    assert!(!s.contains("\x1b"), "ANSI escape found in log file");
}

#[test]
fn test_size_rotation_keeps_bounded_backups() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("app.log");

    let logger = new_file_logger(
        &path,
        [
            with_max_size(256),
            with_max_backups(2),
            with_compress(false),
            with_level("debug"),
        ],
    )
    .expect("file logger");

    for i in 0..50 {
        logger.debug(format_args!("rotation line {:02}", i));
    }
    drop(logger);

    assert_eq!(
        read_dir_names(dir.path()),
        vec!["app.log", "app.log.1", "app.log.2"]
    );
    let newest = fs::read_to_string(&path).unwrap();
    assert!(newest.contains("rotation line 49"));
    let older = fs::read_to_string(dir.path().join("app.log.1")).unwrap();
    assert!(!older.contains("rotation line 49"));
}

#[cfg(feature = "compress")]
#[test]
fn test_size_rotation_compresses_backups() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("app.log");

    let logger = new_file_logger(&path, [with_max_size(128), with_max_backups(3)])
        .expect("file logger");
    assert!(logger.config().compress, "compression is on by default");

    for i in 0..10 {
        logger.error(format_args!("compressed line {}", i));
    }
    drop(logger);

    let names = read_dir_names(dir.path());
    assert!(names.contains(&"app.log.1.gz".to_string()), "{:?}", names);
    assert!(!names.contains(&"app.log.1".to_string()), "{:?}", names);
}

#[test]
fn test_raw_write_shares_the_rotating_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("raw.log");

    let logger = new_file_logger(&path, [with_rotate_interval("1d"), with_buffer_size(0)])
        .expect("file logger");
    assert!(matches!(logger.rotation(), Some(RotationTrigger::Time { .. })));

    let message = b"raw bytes\n";
    assert_eq!(logger.write(message).expect("write"), message.len());
    logger.warn(format_args!("after raw"));

    let s = fs::read_to_string(&path).unwrap();
    let raw_at = s.find("raw bytes").expect("raw bytes present");
    let line_at = s.find("after raw").expect("log line present");
    assert!(raw_at < line_at);
}

#[test]
fn test_buffered_output_is_flushed_on_drop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("buffered.log");

    let logger = new_file_logger(&path, [with_max_size(1 << 20), with_buffer_size(8 * 1024)])
        .expect("file logger");
    logger.info(format_args!("kept until drop"));
    assert!(!fs::read_to_string(&path).unwrap().contains("kept until drop"));

    drop(logger);
    assert!(fs::read_to_string(&path).unwrap().contains("kept until drop"));
}
