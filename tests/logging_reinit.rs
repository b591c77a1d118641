use std::{fs, thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn reinit_keeps_first_subscriber() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.txt");

    instax_draw::logging::init(true, Some(first.clone()));
    instax_draw::logging::init(false, Some(dir.path().join("second.txt")));
    tracing::info!("after reinit");

    sleep(Duration::from_millis(100));

    let contents = fs::read_to_string(first).unwrap();
    assert!(contents.contains("after reinit"));
}
