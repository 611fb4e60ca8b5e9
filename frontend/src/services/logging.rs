use log::LevelFilter;

/// Install `env_logger` at the given level.
///
/// Records carry their module path as the target, so `RUST_LOG` can narrow
/// output to one component. Safe to call more than once; later calls are
/// ignored. The library never calls this itself.
pub fn init(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init();
}
