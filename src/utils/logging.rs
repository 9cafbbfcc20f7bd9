//! Per-module switchable logging.
//!
//! A module opts in by declaring `const ENABLE_LOGS: bool` and calling
//! `log_info!` / `log_warn!` (exported at the crate root). Flipping the const
//! silences that module without touching `RUST_LOG`.

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Install `env_logger`. `RUST_LOG` takes precedence over the default level,
/// which is `Info`, or `Debug` when `debug` is set. A second call is a no-op.
pub fn init(debug: bool) {
    let default_level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}
