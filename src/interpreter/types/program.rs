//! Compiled programs

use super::instruction::Instruction;
use crate::interpreter::errors::CompileError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Index;

/// Ordered, immutable sequence of instructions addressed by index
///
/// Labels live inline in the sequence; there is no side table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, ip: usize) -> Option<&Instruction> {
        self.instructions.get(ip)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Where a jump at `at` with `offset` lands
    ///
    /// `len()` itself is a valid target (normal termination).
    pub fn jump_target(&self, at: usize, offset: isize) -> Option<usize> {
        at.checked_add_signed(offset)
            .filter(|target| *target <= self.len())
    }

    /// Nearest `label` with the given name strictly above `from`
    pub fn find_label_before(&self, from: usize, label: &str) -> Option<usize> {
        self.instructions[..from.min(self.len())]
            .iter()
            .rposition(|instr| matches!(instr, Instruction::Label(name) if name == label))
    }

    /// Check every jump target and call label
    pub fn validate(&self) -> Result<(), CompileError> {
        for (at, instr) in self.iter().enumerate() {
            if let Some(offset) = instr.jump_offset() {
                if self.jump_target(at, offset).is_none() {
                    return Err(CompileError::JumpOutOfRange {
                        at,
                        offset,
                        len: self.len(),
                    });
                }
            }
            if let Instruction::Call(label) = instr {
                if self.find_label_before(at, label).is_none() {
                    return Err(CompileError::UnresolvedLabel {
                        at,
                        label: label.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// SHA-256 over the textual form, identifies a compiled script in logs
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for instr in self.iter() {
            hasher.update(instr.to_string().as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::new(instructions)
    }
}

impl Index<usize> for Program {
    type Output = Instruction;

    fn index(&self, ip: usize) -> &Instruction {
        &self.instructions[ip]
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (ip, instr) in self.iter().enumerate() {
            writeln!(f, "{:04} {}", ip, instr)?;
        }
        Ok(())
    }
}
