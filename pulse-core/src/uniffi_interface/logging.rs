//! Log output for the host app. Records from this crate follow the chosen
//! level; everything else is held at warnings.

use chrono::Utc;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// `pulse::session::lifecycle` prints as `session::lifecycle`.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(CRATE_TARGET)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(target)
}

// The filters are fixed once installed; later calls only move the max level.
fn apply_level(level: LevelFilter) {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let installed = env_logger::Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} {:<5} {} - {}",
                    Utc::now().format("%H:%M:%S%.3f"),
                    record.level(),
                    short_target(record.target()),
                    record.args()
                )
            })
            .target(env_logger::Target::Stdout)
            .filter_level(LevelFilter::Warn)
            .filter_module(CRATE_TARGET, LevelFilter::Trace)
            .try_init();
        if installed.is_err() {
            log::warn!("A logger was already installed, keeping it");
        }
    });
    log::set_max_level(level);
}

#[uniffi::export]
pub fn set_debug_log_level() {
    apply_level(LevelFilter::Trace);
}

/// Returns false for an unrecognised level name.
#[uniffi::export]
pub fn set_log_level(level: &str) -> bool {
    match parse_level(level) {
        Some(lvl) => {
            apply_level(lvl);
            true
        }
        None => false,
    }
}

/// The level currently in force, lower-case.
#[uniffi::export]
pub fn log_level() -> String {
    log::max_level().to_string().to_lowercase()
}
