//! Virtual Machine state
//!
//! The VM holds all execution state:
//! - program: the loaded, immutable instruction sequence
//! - ip: index of the next instruction
//! - call_stack: return addresses pushed by `call`
//! - until_guards: `until` loops currently being executed
//! - vars: script variables
//!
//! Client handles are shared with the caller and never owned by the VM.

use super::log_sink::{LogSink, TracingSink};
use crate::client::Client;
use crate::config::VmSettings;
use crate::interpreter::errors::VmError;
use crate::interpreter::types::{PlayerSelector, Program, UntilGuard, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/* ===================== VM ===================== */

pub struct VM {
    clients: Vec<Arc<dyn Client>>,
    settings: VmSettings,
    sink: Arc<dyn LogSink>,

    pub(super) program: Arc<Program>,
    pub(super) ip: usize,
    pub(super) call_stack: Vec<usize>,
    pub(super) until_guards: Vec<UntilGuard>,
    pub(super) vars: HashMap<String, Value>,

    running: bool,
    killed: bool,
}

impl VM {
    /// Create an idle VM driving the given clients, in order
    pub fn new(clients: Vec<Arc<dyn Client>>) -> Self {
        VM {
            clients,
            settings: VmSettings::default(),
            sink: Arc::new(TracingSink),
            program: Arc::new(Program::default()),
            ip: 0,
            call_stack: Vec::new(),
            until_guards: Vec::new(),
            vars: HashMap::new(),
            running: false,
            killed: false,
        }
    }

    pub fn with_settings(mut self, settings: VmSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the loaded program, discarding all execution state
    pub fn load(&mut self, program: Program) {
        self.reset();
        debug!(
            len = program.len(),
            fingerprint = %program.fingerprint(),
            "program loaded"
        );
        self.program = Arc::new(program);
    }

    /// Drop the program and clear pointer, stacks and variables
    ///
    /// `killed` is left untouched: a killed bot stays killed.
    pub fn reset(&mut self) {
        self.program = Arc::new(Program::default());
        self.ip = 0;
        self.call_stack.clear();
        self.until_guards.clear();
        self.vars.clear();
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn kill(&mut self) {
        self.stop();
        self.killed = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn var(&self, ident: &str) -> Option<&Value> {
        self.vars.get(ident)
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn clients(&self) -> &[Arc<dyn Client>] {
        &self.clients
    }

    pub(super) fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    pub(super) fn poll_interval(&self) -> Duration {
        self.settings.poll_interval()
    }

    /* ===================== Players ===================== */

    /// Client by 1-based player number
    pub fn player_by_num(&self, num: usize) -> Result<&Arc<dyn Client>, VmError> {
        num.checked_sub(1)
            .and_then(|i| self.clients.get(i))
            .ok_or(VmError::PlayerOutOfRange {
                num,
                open: self.clients.len(),
            })
    }

    /// Clients picked by `selector`, in client order
    pub fn select_players(&self, selector: &PlayerSelector) -> Vec<Arc<dyn Client>> {
        selector.select(&self.clients).into_iter().cloned().collect()
    }
}

/* ===================== Step Result ===================== */

/// Result of executing one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The VM is still running
    Continue,
    /// The VM stopped (end of program, kill, or it was never started)
    Done,
}
