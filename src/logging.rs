use crate::draw::settings::DrawSettings;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialise logging. With `debug` the default level is `debug` and `RUST_LOG`
/// may override it; otherwise the level is pinned to `info`.
/// When `file` is given, events are also appended to that file.
pub fn init(debug: bool, file: Option<PathBuf>) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let file_layer = file.and_then(|path| {
        let dir = path.parent().map(PathBuf::from).unwrap_or_default();
        let name = path.file_name()?.to_owned();
        let appender = tracing_appender::rolling::never(dir, name);
        Some(fmt::layer().with_ansi(false).with_writer(appender))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();
}

/// [`init`] with the level taken from `DrawSettings::debug_logging`.
pub fn init_from_settings(settings: &DrawSettings, file: Option<PathBuf>) {
    init(settings.debug_logging, file);
}
