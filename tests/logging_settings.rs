use std::{fs, thread::sleep, time::Duration};

use instax_draw::draw::DrawSettings;
use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn debug_logging_setting_enables_debug_events() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("draw.log");

    let mut settings = DrawSettings::default();
    settings.debug_logging = true;
    instax_draw::logging::init_from_settings(&settings, Some(path.clone()));
    tracing::debug!("debug from settings");

    sleep(Duration::from_millis(100));

    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("debug from settings"));
}
