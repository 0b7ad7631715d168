//! A failed first init still spends the one-time guard.

use std::sync::Arc;

use slogger::{Error, get_logger, init, init_file, with_rotate_interval};

#[test]
fn test_failed_init_file_spends_the_guard() {
    let dir = tempfile::tempdir().expect("tempdir");

    let result = init_file(dir.path().join("app.log"), [with_rotate_interval("1y")]);
    assert!(matches!(result, Err(Error::Interval(_))));

    // No logger was installed, but init no longer does anything either.
    init([]).expect("no-op");
    let logger = get_logger();
    assert!(Arc::ptr_eq(&logger, &get_logger()));
    assert!(!dir.path().join("app.log").exists());
}
