//! Core execution loop
//!
//! `step()` executes exactly one instruction. The drivers (`run`,
//! `run_until_cancelled`) call it until the VM stops.
//!
//! Instructions execute strictly in program order. Concurrency only happens
//! inside a single instruction, when it fans out over several clients.

use super::stdlib::duration_from_secs;
use super::vm::{Step, VM};
use crate::interpreter::errors::VmError;
use crate::interpreter::types::{Instruction, LogToken, UntilGuard, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/* ===================== Public API ===================== */

impl VM {
    /// Run the loaded program until it stops or fails
    ///
    /// A failing instruction stops the VM and its error is returned; the
    /// pointer is left on the failing instruction.
    pub async fn run(&mut self) -> Result<(), VmError> {
        self.start();
        while self.is_running() {
            if let Err(err) = self.step().await {
                self.stop();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Like `run`, but stops as soon as `token` is cancelled
    ///
    /// An instruction interrupted by cancellation is abandoned without
    /// advancing the pointer.
    pub async fn run_until_cancelled(&mut self, token: &CancellationToken) -> Result<(), VmError> {
        self.start();
        while self.is_running() {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = self.step() => Some(result),
            };
            match outcome {
                None => {
                    debug!(ip = self.ip, "run cancelled");
                    self.stop();
                }
                Some(Err(err)) => {
                    self.stop();
                    return Err(err);
                }
                Some(Ok(_)) => {}
            }
        }
        Ok(())
    }

    /// Execute one instruction
    ///
    /// No-op returning `Step::Done` when the VM is not running.
    pub async fn step(&mut self) -> Result<Step, VmError> {
        if !self.is_running() {
            return Ok(Step::Done);
        }

        // Holding our own handle keeps `instruction` valid while `self` is mutated
        let program = Arc::clone(&self.program);
        let ip = self.ip;
        let Some(instruction) = program.get(ip) else {
            self.stop();
            return Ok(Step::Done);
        };
        trace!(ip, %instruction, "step");

        match instruction {
            Instruction::Kill => {
                self.kill();
                debug!(ip, "bot killed");
            }

            Instruction::Sleep(expr) => {
                let seconds = self.eval_number(expr, "sleep").await?;
                tokio::time::sleep(duration_from_secs(seconds, "sleep")?).await;
                self.ip += 1;
            }

            Instruction::LogLiteral(tokens) => {
                let line = tokens
                    .iter()
                    .map(LogToken::text)
                    .collect::<Vec<_>>()
                    .join(" ");
                self.sink().log(&line);
                self.ip += 1;
            }

            Instruction::LogWindow { selector, path } => {
                self.log_window(selector, path).await?;
                self.ip += 1;
            }

            Instruction::Jump(offset) => {
                let back_edge = self
                    .until_guards
                    .last()
                    .filter(|guard| guard.is_back_edge(ip))
                    .map(|guard| (guard.cond.clone(), guard.exit));
                let exit = match back_edge {
                    Some((cond, exit)) => self.eval_condition(&cond).await?.then_some(exit),
                    None => None,
                };
                match exit {
                    Some(exit) => {
                        self.until_guards.pop();
                        self.ip = exit;
                    }
                    None => self.jump(ip, *offset)?,
                }
            }

            Instruction::JumpIf { cond, offset } => {
                if self.eval_condition(cond).await? {
                    self.jump(ip, *offset)?;
                } else {
                    self.ip += 1;
                }
            }

            Instruction::JumpIfn { cond, offset } => {
                if self.eval_condition(cond).await? {
                    self.ip += 1;
                } else {
                    self.jump(ip, *offset)?;
                }
            }

            Instruction::EnterUntil { cond, offset } => {
                let exit = self.jump_target(ip, *offset)?;
                self.until_guards.push(UntilGuard {
                    cond: cond.clone(),
                    exit,
                });
                self.ip += 1;
            }

            Instruction::Label(_) | Instruction::Nop => {
                self.ip += 1;
            }

            Instruction::Call(label) => {
                let target = program
                    .find_label_before(ip, label)
                    .ok_or_else(|| VmError::LabelNotFound(label.clone()))?;
                self.call_stack.push(ip + 1);
                self.ip = target;
            }

            Instruction::Ret => {
                self.ip = self.call_stack.pop().ok_or(VmError::CallStackUnderflow)?;
            }

            Instruction::DeimosCall { selector, call } => {
                self.exec_deimos_call(selector, call).await?;
                self.ip += 1;
            }

            Instruction::LoadPlaystyle {
                selector,
                playstyle,
            } => {
                self.load_playstyle(selector, playstyle).await?;
                self.ip += 1;
            }

            Instruction::SetVar { ident, expr } => {
                let value = self.eval(expr).await?;
                self.vars.insert(ident.clone(), value);
                self.ip += 1;
            }

            Instruction::DecVar(ident) => {
                match self.vars.get_mut(ident) {
                    Some(Value::Number(n)) => *n -= 1.0,
                    Some(other) => {
                        return Err(VmError::TypeMismatch {
                            context: "dec_var",
                            expected: "number",
                            found: other.type_name(),
                        })
                    }
                    None => return Err(VmError::UnknownVariable(ident.clone())),
                }
                self.ip += 1;
            }
        }

        if self.ip >= program.len() {
            debug!(ip = self.ip, "program finished");
            self.stop();
        }

        Ok(if self.is_running() {
            Step::Continue
        } else {
            Step::Done
        })
    }

    /* ===================== Jumps ===================== */

    fn jump_target(&self, at: usize, offset: isize) -> Result<usize, VmError> {
        self.program
            .jump_target(at, offset)
            .ok_or(VmError::JumpOutOfRange {
                at,
                offset,
                len: self.program.len(),
            })
    }

    fn jump(&mut self, at: usize, offset: isize) -> Result<(), VmError> {
        self.ip = self.jump_target(at, offset)?;
        Ok(())
    }
}
