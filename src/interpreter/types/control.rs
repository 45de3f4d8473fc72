//! Loop bookkeeping held by the VM

use super::ast::Expression;

/// Active `until` loop
///
/// Pushed by `enter_until`, checked when the loop-back jump at `exit - 1`
/// executes, popped once the condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct UntilGuard {
    pub cond: Expression,
    /// Index of the loop's trailing `nop`
    pub exit: usize,
}

impl UntilGuard {
    /// Whether the instruction at `ip` is this loop's back-edge
    pub fn is_back_edge(&self, ip: usize) -> bool {
        self.exit.checked_sub(1) == Some(ip)
    }
}
