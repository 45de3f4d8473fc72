//! deimoslang interpreter
//!
//! ```text
//! AST (from the parser) -> Compiler::compile -> Program -> VM::load -> VM::step ...
//! ```

pub mod compiler;
pub mod errors;
pub mod executor;
pub mod types;

#[cfg(test)]
mod compiler_tests;

pub use compiler::Compiler;
pub use errors::{CompileError, VmError};
pub use executor::{LogSink, MemorySink, Step, TracingSink, VM};
pub use types::{Instruction, InstructionKind, PlayerSelector, Program, Stmt, Value};
