//! Profiling helpers built on the `log` crate.

use log::{log_enabled, Level};
use std::time::Instant;

/// Scoped trace-level timer; logs the elapsed time of the guarded section
/// when dropped. Costs nothing when trace logging is disabled.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Option<Instant>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        let start = log_enabled!(Level::Trace).then(Instant::now);
        Self { label, start }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            log::trace!("{} took {} µs", self.label, start.elapsed().as_micros());
        }
    }
}
