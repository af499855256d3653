//! Structured logging, generalized from the teacher's `logging` module.
//!
//! This crate is a library with no app-data directory of its own, so
//! `init_logging` writes to stderr via `simplelog::TermLogger` rather than
//! the teacher's `careerbench.log` file — callers embedding this pipeline
//! in a service are expected to redirect stderr (or configure their own
//! `log` backend) rather than have the library open files on their behalf.

use log::LevelFilter;
use simplelog::{Config, TermLogger, TerminalMode, ColorChoice};

static LOG_INITIALIZED: std::sync::Once = std::sync::Once::new();

/// Initializes the global logger at the given level. Safe to call more than
/// once; only the first call takes effect.
pub fn init_logging(level: LevelFilter) {
    LOG_INITIALIZED.call_once(|| {
        if let Err(e) = TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ) {
            eprintln!("failed to initialize logger: {}", e);
        } else {
            log::info!("logging initialized at {:?}", level);
        }
    });
}

/// Logs a panic with its location, for embedding into binaries that wrap
/// this library.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());

        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        log::error!("panic: {} at {}", message, location);
    }));
}

/// Logs a [`crate::errors::PipelineError`] with the variant-specific detail
/// the teacher's `log_careerbench_error` attaches per error kind.
pub fn log_pipeline_error(context: &str, error: &crate::errors::PipelineError) {
    use crate::errors::PipelineError;
    use std::error::Error;

    log::error!("[{}] {}", context, error);
    match error {
        PipelineError::Adapter(e) => log::error!("[{}] adapter error detail: {:?}", context, e),
        PipelineError::Parse(e) => log::warn!("[{}] parse error detail: {:?}", context, e),
        PipelineError::Configuration(msg) => log::warn!("[{}] configuration: {}", context, msg),
        PipelineError::Application(msg) => log::error!("[{}] application: {}", context, msg),
    }
    if let Some(source) = error.source() {
        log::error!("[{}] root cause: {}", context, source);
    }
}

pub fn log_warning(context: &str, message: &str) {
    log::warn!("[{}] {}", context, message);
}

pub fn log_debug(context: &str, message: &str) {
    log::debug!("[{}] {}", context, message);
}

pub fn log_info(context: &str, message: &str) {
    log::info!("[{}] {}", context, message);
}
