//! Compiler - lowers a statement tree into a flat Program
//!
//! Structured control flow becomes relative jumps. Offsets are counted from
//! the jump itself (`+1` is the next instruction) and are always derived from
//! the emitted length of independently compiled sub-blocks.
//!
//! ## Lowerings (B = body length, F/T = false/true branch lengths)
//!
//! ```text
//! block name { .. }    jump B+3; label name; <body>; ret; nop
//! if c { T } else { F } jump_if c, F+2; <F>; jump T+1; <T>; nop
//! while c { .. }       jump_ifn c, B+2; <body>; jump_if c, -B; nop
//! until c { .. }       enter_until c, B+2; <body>; jump -B; nop
//! loop { .. }          <body>; jump -B
//! call name            call name; nop
//! ```

use super::errors::CompileError;
use super::types::{
    Command, CommandKind, DeimosCall, Instruction, LogOutput, Program, Stmt, WaitforCommand,
};
use tracing::debug;

pub struct Compiler {
    program: Vec<Instruction>,
}

impl Compiler {
    /// Compile a parsed script into a validated Program
    pub fn compile(stmts: &[Stmt]) -> Result<Program, CompileError> {
        let program = Program::new(compile_block(stmts)?);
        program.validate()?;
        debug!(
            len = program.len(),
            fingerprint = %program.fingerprint(),
            "compiled program"
        );
        Ok(program)
    }

    fn new() -> Self {
        Self {
            program: Vec::new(),
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.program.push(instruction);
    }

    fn emit_all(&mut self, instructions: Vec<Instruction>) {
        self.program.extend(instructions);
    }

    /* ===================== Statements ===================== */

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::List { stmts } => {
                for stmt in stmts {
                    self.compile_stmt(stmt)?;
                }
            }

            Stmt::Command { command } => self.compile_command(command)?,

            Stmt::BlockDef { ident, body } => {
                let body = compile_block(body)?;
                self.emit(Instruction::Jump(offset(body.len() + 3)?));
                self.emit(Instruction::Label(ident.clone()));
                self.emit_all(body);
                self.emit(Instruction::Ret);
                self.emit(Instruction::Nop);
            }

            Stmt::If {
                expr,
                branch_true,
                branch_false,
            } => {
                let on_false = compile_block(branch_false)?;
                let on_true = compile_block(branch_true)?;
                self.emit(Instruction::JumpIf {
                    cond: expr.clone(),
                    offset: offset(on_false.len() + 2)?,
                });
                self.emit_all(on_false);
                self.emit(Instruction::Jump(offset(on_true.len() + 1)?));
                self.emit_all(on_true);
                self.emit(Instruction::Nop);
            }

            Stmt::While { expr, body } => {
                let mut body = compile_block(body)?;
                let back = -offset(body.len())?;
                body.push(Instruction::JumpIf {
                    cond: expr.clone(),
                    offset: back,
                });
                // body.len() now includes the loop-back jump
                self.emit(Instruction::JumpIfn {
                    cond: expr.clone(),
                    offset: offset(body.len() + 1)?,
                });
                self.emit_all(body);
                self.emit(Instruction::Nop);
            }

            Stmt::Until { expr, body } => {
                let mut body = compile_block(body)?;
                let back = -offset(body.len())?;
                body.push(Instruction::Jump(back));
                self.emit(Instruction::EnterUntil {
                    cond: expr.clone(),
                    offset: offset(body.len() + 1)?,
                });
                self.emit_all(body);
                self.emit(Instruction::Nop);
            }

            Stmt::Loop { body } => {
                let mut body = compile_block(body)?;
                let back = -offset(body.len())?;
                body.push(Instruction::Jump(back));
                self.emit_all(body);
            }

            Stmt::Call { ident } => {
                self.emit(Instruction::Call(ident.clone()));
                self.emit(Instruction::Nop);
            }

            Stmt::SetVar { ident, expr } => self.emit(Instruction::SetVar {
                ident: ident.clone(),
                expr: expr.clone(),
            }),

            Stmt::DecVar { ident } => self.emit(Instruction::DecVar(ident.clone())),
        }
        Ok(())
    }

    /* ===================== Commands ===================== */

    fn compile_command(&mut self, command: &Command) -> Result<(), CompileError> {
        let selector = &command.selector;
        let call = match &command.kind {
            CommandKind::Kill => {
                self.emit(Instruction::Kill);
                return Ok(());
            }
            CommandKind::Sleep { duration } => {
                self.emit(Instruction::Sleep(duration.clone()));
                return Ok(());
            }
            CommandKind::Log {
                output: LogOutput::Literal { tokens },
            } => {
                self.emit(Instruction::LogLiteral(tokens.clone()));
                return Ok(());
            }
            CommandKind::Log {
                output: LogOutput::Window { path },
            } => {
                self.emit(Instruction::LogWindow {
                    selector: selector.clone(),
                    path: path.clone(),
                });
                return Ok(());
            }
            CommandKind::LoadPlaystyle { playstyle } => {
                self.emit(Instruction::LoadPlaystyle {
                    selector: selector.clone(),
                    playstyle: playstyle.clone(),
                });
                return Ok(());
            }
            CommandKind::Waitfor(wait) => {
                if wait.completion {
                    // The first half only waits for the condition to appear
                    let first = WaitforCommand {
                        completion: false,
                        ..wait.clone()
                    };
                    self.emit(Instruction::DeimosCall {
                        selector: selector.clone(),
                        call: DeimosCall::Waitfor(first),
                    });
                }
                DeimosCall::Waitfor(wait.clone())
            }

            CommandKind::SendKey { key, seconds } => DeimosCall::SendKey {
                key: key.clone(),
                seconds: seconds.clone(),
            },
            CommandKind::Click { x, y } => DeimosCall::Click {
                x: x.clone(),
                y: y.clone(),
            },
            CommandKind::Teleport { target } => DeimosCall::Teleport {
                target: target.clone(),
            },
            CommandKind::Goto { target } => DeimosCall::Goto {
                target: target.clone(),
            },
            CommandKind::UsePotion => DeimosCall::UsePotion,
            CommandKind::BuyPotions => DeimosCall::BuyPotions,
            CommandKind::Relog => DeimosCall::Relog,
            CommandKind::ToZone { path } => DeimosCall::ToZone { path: path.clone() },

            CommandKind::Expr { .. } => {
                return Err(CompileError::UnsupportedCommand(
                    command.kind.name().to_string(),
                ))
            }
        };
        self.emit(Instruction::DeimosCall {
            selector: selector.clone(),
            call,
        });
        Ok(())
    }
}

/// Compile a block on its own, independent of what surrounds it
fn compile_block(stmts: &[Stmt]) -> Result<Vec<Instruction>, CompileError> {
    let mut compiler = Compiler::new();
    for stmt in stmts {
        compiler.compile_stmt(stmt)?;
    }
    Ok(compiler.program)
}

fn offset(len: usize) -> Result<isize, CompileError> {
    isize::try_from(len).map_err(|_| CompileError::ProgramTooLarge)
}
