//! Logging utilities

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Initialize the logging system
///
/// `level` is the default filter; `RUST_LOG` still overrides it.
pub fn init(level: LevelFilter) {
    // A second init (e.g. from tests) keeps the first logger
    let _ = builder(level).try_init();
}

fn builder(level: LevelFilter) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();
    builder
}
