use simplelog::{Config, LevelFilter, SimpleLogger};
use std::sync::Once;

static INIT_LOGGER_ONCE: Once = Once::new();

/// Call once before instantiating the library to get logs. Subsequent calls
/// have no effect.
pub fn init_logger_once(min_level: LevelFilter) {
    INIT_LOGGER_ONCE.call_once(|| {
        SimpleLogger::init(min_level, Config::default()).expect("no other logger may be set")
    });
}
