//! Where script output goes
//!
//! `log` statements do not write to a global logger; the VM is handed a sink.

use parking_lot::Mutex;
use tracing::info;

/// Receives one line per `log` statement (or per client for `log window`)
pub trait LogSink: Send + Sync {
    fn log(&self, line: &str);
}

/// Forwards script output to `tracing` under the `deimos::script` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, line: &str) {
        info!(target: "deimos::script", "{}", line);
    }
}

/// Keeps every line in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LogSink for MemorySink {
    fn log(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
