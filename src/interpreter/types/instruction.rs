//! Instruction set
//!
//! One variant per instruction kind, each with its own typed payload. Jump
//! offsets are relative to the jump itself: `+1` is the next instruction.

use super::ast::{Expression, LogToken, TeleportTarget, WaitforCommand};
use super::selector::PlayerSelector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of instruction kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    Kill,
    Sleep,
    LogLiteral,
    LogWindow,
    Jump,
    JumpIf,
    JumpIfn,
    EnterUntil,
    Label,
    Ret,
    Call,
    DeimosCall,
    LoadPlaystyle,
    SetVar,
    DecVar,
    Nop,
}

impl InstructionKind {
    pub fn name(self) -> &'static str {
        match self {
            InstructionKind::Kill => "kill",
            InstructionKind::Sleep => "sleep",
            InstructionKind::LogLiteral => "log_literal",
            InstructionKind::LogWindow => "log_window",
            InstructionKind::Jump => "jump",
            InstructionKind::JumpIf => "jump_if",
            InstructionKind::JumpIfn => "jump_ifn",
            InstructionKind::EnterUntil => "enter_until",
            InstructionKind::Label => "label",
            InstructionKind::Ret => "ret",
            InstructionKind::Call => "call",
            InstructionKind::DeimosCall => "deimos_call",
            InstructionKind::LoadPlaystyle => "load_playstyle",
            InstructionKind::SetVar => "set_var",
            InstructionKind::DecVar => "dec_var",
            InstructionKind::Nop => "nop",
        }
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One unit of compiled behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Instruction {
    Kill,
    /// Seconds to suspend
    Sleep(Expression),
    LogLiteral(Vec<LogToken>),
    LogWindow {
        selector: PlayerSelector,
        path: Vec<String>,
    },
    Jump(isize),
    JumpIf {
        cond: Expression,
        offset: isize,
    },
    JumpIfn {
        cond: Expression,
        offset: isize,
    },
    EnterUntil {
        cond: Expression,
        offset: isize,
    },
    Label(String),
    Ret,
    Call(String),
    DeimosCall {
        selector: PlayerSelector,
        call: DeimosCall,
    },
    LoadPlaystyle {
        selector: PlayerSelector,
        playstyle: String,
    },
    SetVar {
        ident: String,
        expr: Expression,
    },
    DecVar(String),
    Nop,
}

impl Instruction {
    pub fn kind(&self) -> InstructionKind {
        match self {
            Instruction::Kill => InstructionKind::Kill,
            Instruction::Sleep(_) => InstructionKind::Sleep,
            Instruction::LogLiteral(_) => InstructionKind::LogLiteral,
            Instruction::LogWindow { .. } => InstructionKind::LogWindow,
            Instruction::Jump(_) => InstructionKind::Jump,
            Instruction::JumpIf { .. } => InstructionKind::JumpIf,
            Instruction::JumpIfn { .. } => InstructionKind::JumpIfn,
            Instruction::EnterUntil { .. } => InstructionKind::EnterUntil,
            Instruction::Label(_) => InstructionKind::Label,
            Instruction::Ret => InstructionKind::Ret,
            Instruction::Call(_) => InstructionKind::Call,
            Instruction::DeimosCall { .. } => InstructionKind::DeimosCall,
            Instruction::LoadPlaystyle { .. } => InstructionKind::LoadPlaystyle,
            Instruction::SetVar { .. } => InstructionKind::SetVar,
            Instruction::DecVar(_) => InstructionKind::DecVar,
            Instruction::Nop => InstructionKind::Nop,
        }
    }

    /// Relative offset carried by jump-like instructions
    pub fn jump_offset(&self) -> Option<isize> {
        match self {
            Instruction::Jump(offset)
            | Instruction::JumpIf { offset, .. }
            | Instruction::JumpIfn { offset, .. }
            | Instruction::EnterUntil { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Actions dispatched to the client provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum DeimosCall {
    SendKey {
        key: Expression,
        seconds: Option<Expression>,
    },
    Click {
        x: Expression,
        y: Expression,
    },
    Teleport {
        target: TeleportTarget,
    },
    Goto {
        target: Expression,
    },
    UsePotion,
    BuyPotions,
    Relog,
    ToZone {
        path: Vec<String>,
    },
    Waitfor(WaitforCommand),
}

impl DeimosCall {
    /// Action tag, as written in scripts
    pub fn name(&self) -> &'static str {
        match self {
            DeimosCall::SendKey { .. } => "sendkey",
            DeimosCall::Click { .. } => "click",
            DeimosCall::Teleport { .. } => "teleport",
            DeimosCall::Goto { .. } => "goto",
            DeimosCall::UsePotion => "usepotion",
            DeimosCall::BuyPotions => "buypotions",
            DeimosCall::Relog => "relog",
            DeimosCall::ToZone { .. } => "tozone",
            DeimosCall::Waitfor(_) => "waitfor",
        }
    }
}

/* ===================== Debug Form ===================== */

impl fmt::Display for DeimosCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        match self {
            DeimosCall::SendKey { key, seconds } => {
                write!(f, " {}", key)?;
                if let Some(seconds) = seconds {
                    write!(f, " {}", seconds)?;
                }
                Ok(())
            }
            DeimosCall::Click { x, y } => write!(f, " {} {}", x, y),
            DeimosCall::Teleport { target } => write!(f, " {}", target),
            DeimosCall::Goto { target } => write!(f, " {}", target),
            DeimosCall::ToZone { path } => write!(f, " {}", path.join("/")),
            DeimosCall::Waitfor(wait) => write!(f, " {}", wait),
            DeimosCall::UsePotion | DeimosCall::BuyPotions | DeimosCall::Relog => Ok(()),
        }
    }
}

/// Kind name followed by the payload, if any
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind().name())?;
        match self {
            Instruction::Kill | Instruction::Ret | Instruction::Nop => Ok(()),
            Instruction::Sleep(expr) => write!(f, " {}", expr),
            Instruction::LogLiteral(tokens) => {
                for token in tokens {
                    write!(f, " {}", token)?;
                }
                Ok(())
            }
            Instruction::LogWindow { selector, path } => {
                write!(f, " {} {}", selector, path.join("/"))
            }
            Instruction::Jump(offset) => write!(f, " {}", offset),
            Instruction::JumpIf { cond, offset }
            | Instruction::JumpIfn { cond, offset }
            | Instruction::EnterUntil { cond, offset } => write!(f, " {}, {}", cond, offset),
            Instruction::Label(name) | Instruction::Call(name) | Instruction::DecVar(name) => {
                write!(f, " {}", name)
            }
            Instruction::DeimosCall { selector, call } => write!(f, " {} {}", selector, call),
            Instruction::LoadPlaystyle {
                selector,
                playstyle,
            } => write!(f, " {} {:?}", selector, playstyle),
            Instruction::SetVar { ident, expr } => write!(f, " {} {}", ident, expr),
        }
    }
}
