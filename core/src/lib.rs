//! Cognitive runtime core for Aria — a persistent, heartbeat-driven AI agent.
//!
//! # Architecture
//! - `error`: crate-wide error taxonomy
//! - `config`: tools descriptor + model catalog loaders
//! - `store`: typed facade over the persistent store (goals, activities,
//!   memories, sessions, skill invocations, knowledge, jobs)
//! - `memory`: semantic (vector) memory backend
//! - `skills`: skill registry, rate limiting, invocation envelope
//! - `agent`: multi-agent coordinator, pheromone-weighted routing
//! - `scheduler`: heartbeat scheduler (cron-like jobs)
//! - `session`: session manager and working-memory checkpointing
//! - `cognition`: the per-message processing pipeline
//! - `router`: model router (LLM proxy) client
//! - `core`: the process-wide `Core` struct wiring everything together

#![deny(unsafe_code)]

use std::sync::Mutex;

/// Global log file handle for debug.log, used only on paths that must not
/// write to stdout/stderr (e.g. an interactive terminal in raw mode).
static DEBUG_LOG: Mutex<Option<std::fs::File>> = Mutex::new(None);

/// Initialize debug.log file logging.
pub fn init_debug_log(path: Option<std::path::PathBuf>) -> std::io::Result<()> {
    let log_path = path.unwrap_or_else(|| std::path::PathBuf::from("debug.log"));
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    *DEBUG_LOG.lock().unwrap() = Some(file);
    Ok(())
}

/// Write to debug.log if initialized.
pub fn write_to_debug_log(level: &str, message: &str) {
    use std::io::Write;
    if let Ok(mut guard) = DEBUG_LOG.lock() {
        if let Some(ref mut file) = *guard {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [{}] {}", timestamp, level, message);
            let _ = file.flush();
        }
    }
}

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        $crate::write_to_debug_log("INFO", &msg);
    }};
}

#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        $crate::write_to_debug_log("ERROR", &msg);
    }};
}

#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        $crate::write_to_debug_log("WARN", &msg);
    }};
}

pub mod error;
pub mod util;

pub mod config;
pub mod store;
pub mod memory;
pub mod skills;
pub mod agent;
pub mod scheduler;
pub mod session;
pub mod cognition;
pub mod router;
pub mod core;

pub use error::{AriaError, Result};
pub use crate::core::Core;
