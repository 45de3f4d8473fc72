//! Compiler and VM errors
//!
//! Both kinds are fatal for the script that raised them: compilation is
//! rejected as a whole, and a VM error ends the current run.

use crate::client::{Client, ClientError};
use thiserror::Error;

/// Errors raised while lowering a statement tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("unimplemented command: {0}")]
    UnsupportedCommand(String),

    #[error("jump at {at} with offset {offset} leaves the program (length {len})")]
    JumpOutOfRange { at: usize, offset: isize, len: usize },

    #[error("call at {at} has no label `{label}` above it")]
    UnresolvedLabel { at: usize, label: String },

    #[error("program too large for relative jumps")]
    ProgramTooLarge,
}

/// Errors raised while executing a program
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    #[error("unable to find label: {0}")]
    LabelNotFound(String),

    #[error("ret with an empty call stack")]
    CallStackUnderflow,

    #[error("attempted to get client {num}, but only {open} client(s) are open")]
    PlayerOutOfRange { num: usize, open: usize },

    #[error("jump at {at} with offset {offset} leaves the program (length {len})")]
    JumpOutOfRange { at: usize, offset: isize, len: usize },

    #[error("type error in {context}: expected {expected}, got {found}")]
    TypeMismatch {
        context: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid operand for {instruction}: {reason}")]
    InvalidOperand {
        instruction: &'static str,
        reason: String,
    },

    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("unable to find window at path: {0}")]
    WindowNotFound(String),

    #[error("client {client}: {source}")]
    Client {
        client: String,
        #[source]
        source: ClientError,
    },
}

impl VmError {
    /// Attach the failing client's title to a provider error
    pub fn client(client: &dyn Client, source: ClientError) -> Self {
        VmError::Client {
            client: client.title().to_string(),
            source,
        }
    }
}
