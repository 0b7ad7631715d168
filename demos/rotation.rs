//! File logging with size rotation and gzip backups.

use slogger::{Logger, new_file_logger, with_max_backups, with_max_size, with_print_after_init};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let log_path = temp_dir.path().join("test.log");

    let logger = new_file_logger(
        &log_path,
        [
            with_max_size(1024),
            with_max_backups(5),
            with_print_after_init(true),
        ],
    )?;

    for i in 0..100 {
        logger.info(format_args!("Log message number {}", i));
    }
    logger.flush()?;

    for entry in std::fs::read_dir(temp_dir.path())? {
        println!("{}", entry?.file_name().to_string_lossy());
    }

    Ok(())
}
