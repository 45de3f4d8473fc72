//! Type definitions shared by the compiler and the VM
//!
//! - AST nodes handed over by the parser (Stmt, Command, Expression)
//! - Player selectors
//! - Runtime values (Value)
//! - Instructions and programs
//! - Loop bookkeeping (UntilGuard)

pub mod ast;
pub mod control;
pub mod instruction;
pub mod program;
pub mod selector;
pub mod values;

pub use ast::{
    Command, CommandKind, Expression, LogOutput, LogToken, Predicate, Stmt, TeleportTarget,
    UnaryOp, WaitforCommand, WaitforKind,
};
pub use control::UntilGuard;
pub use instruction::{DeimosCall, Instruction, InstructionKind};
pub use program::Program;
pub use selector::PlayerSelector;
pub use values::Value;
