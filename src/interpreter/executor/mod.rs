//! # Executor - the deimoslang virtual machine
//!
//! Interprets a compiled `Program` against an ordered list of clients.
//!
//! ## Core Principles
//!
//! 1. **One instruction per step**: `step()` runs exactly one instruction
//! 2. **Flat control flow**: relative jumps, a call stack of return addresses,
//!    and a stack of active `until` loops
//! 3. **Fan-out inside an instruction only**: multi-client actions run
//!    concurrently and are joined before the pointer moves
//! 4. **Injected output**: `log` lines go to a `LogSink`, not a global logger

pub mod exec_loop;
pub mod expressions;
pub mod log_sink;
pub(crate) mod probe;
pub mod stdlib;
pub mod vm;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use log_sink::{LogSink, MemorySink, TracingSink};
pub use stdlib::DEFAULT_KEY_SECONDS;
pub use vm::{Step, VM};
