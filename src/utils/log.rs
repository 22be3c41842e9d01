// src/utils/log.rs

//! Logging helpers for the engine.
//!
//! The crate logs through the `log` facade and never installs a logger
//! itself; binaries and tests pick their own backend.
//!
//! Per-spot summaries go to `debug!`, clamped configuration and skipped
//! refinements to `warn!`. Nothing is logged from inside pixel loops.
//!
//! ```
//! use spotblend::utils::log::ScopedTimer;
//!
//! let _timer = ScopedTimer::new("structure mask");
//! // ... work ...
//! ```

pub use log::{Level, debug, error, info, log_enabled, trace, warn};

use std::time::Instant;

/// Logs the elapsed time of a scope at debug level when dropped.
#[derive(Debug)]
pub struct ScopedTimer {
    label: &'static str,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(label: &'static str) -> Self {
        ScopedTimer {
            label,
            start: Instant::now(),
        }
    }

    /// Milliseconds since the timer was created.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if log_enabled!(Level::Debug) {
            debug!("{} took {:.2} ms", self.label, self.elapsed_ms());
        }
    }
}
