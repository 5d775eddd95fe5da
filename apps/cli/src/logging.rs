use env_logger::Target;
use log::LevelFilter;

/// Logs to stderr. `--verbose` raises the level once per occurrence;
/// `RUST_LOG` overrides both.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .target(Target::Stderr)
        .filter_level(level)
        .parse_default_env()
        .init();
}
