//! Raw fault channel.
//!
//! A write-only sink for emergency diagnostics, used on paths that must not
//! depend on the logging subsystem (it may not exist yet, or it may be the
//! component that failed). Implementations never fail, never log through
//! `tracing`, and never call back into the sequencer.

use std::io::Write;
use std::sync::Mutex;

pub trait FaultChannel: Send + Sync {
    /// Write one diagnostic line. Best effort; errors are dropped.
    fn report(&self, line: &str);
}

/// Writes straight to the process's stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrFaultChannel;

impl FaultChannel for StderrFaultChannel {
    fn report(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "[bootstrap] {line}");
    }
}

/// Keeps reported lines in memory.
#[derive(Debug, Default)]
pub struct MemoryFaultChannel {
    lines: Mutex<Vec<String>>,
}

impl MemoryFaultChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line reported so far.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl FaultChannel for MemoryFaultChannel {
    fn report(&self, line: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push(line.to_string());
    }
}

impl<T: FaultChannel + ?Sized> FaultChannel for std::sync::Arc<T> {
    fn report(&self, line: &str) {
        (**self).report(line)
    }
}
