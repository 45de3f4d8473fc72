//! Test helpers for executor tests
//!
//! A scripted `MockClient` and shortcuts for compiling JSON ASTs into a VM.

use crate::client::{Client, ClientError, ClientFuture, FriendTarget, Xyz};
use crate::interpreter::executor::{MemorySink, VM};
use crate::interpreter::{Compiler, Program, Stmt};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const QUEST_POSITION: Xyz = Xyz {
    x: 1.0,
    y: 2.0,
    z: 3.0,
};

/// Client whose answers are scripted per predicate
///
/// Each predicate ("dialog", "battle", "free", "loading", "window") pops its
/// next scripted answer; the last one repeats forever. Unscripted predicates
/// answer true, except "loading" which answers false.
pub struct MockClient {
    title: String,
    input_focus: tokio::sync::Mutex<()>,
    answers: Mutex<HashMap<&'static str, VecDeque<bool>>>,
    zones: Mutex<VecDeque<String>>,
    windows: HashMap<String, String>,
    polls: Mutex<HashMap<&'static str, usize>>,
    calls: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
    delay: Duration,
    completed: AtomicUsize,
}

impl MockClient {
    pub fn new(title: &str) -> Self {
        MockClient {
            title: title.to_string(),
            input_focus: tokio::sync::Mutex::new(()),
            answers: Mutex::new(HashMap::new()),
            zones: Mutex::new(VecDeque::from(vec!["WizardCity/WC_Hub".to_string()])),
            windows: HashMap::new(),
            polls: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fail_on: None,
            delay: Duration::ZERO,
            completed: AtomicUsize::new(0),
        }
    }

    pub fn with_answers(self, predicate: &'static str, answers: &[bool]) -> Self {
        self.answers
            .lock()
            .insert(predicate, answers.iter().copied().collect());
        self
    }

    pub fn with_zones(self, zones: &[&str]) -> Self {
        *self.zones.lock() = zones.iter().map(|z| z.to_string()).collect();
        self
    }

    pub fn with_window(mut self, path: &str, text: &str) -> Self {
        self.windows.insert(path.to_string(), text.to_string());
        self
    }

    /// Make every action with this name fail (after the delay)
    pub fn failing_on(mut self, action: &'static str) -> Self {
        self.fail_on = Some(action);
        self
    }

    /// Make every action take this long
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Actions started so far, e.g. `"sendkey A 0.1"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Actions that ran to completion
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn polls(&self, predicate: &str) -> usize {
        self.polls.lock().get(predicate).copied().unwrap_or(0)
    }

    fn answer(&self, predicate: &'static str) -> ClientFuture<'_, bool> {
        *self.polls.lock().entry(predicate).or_default() += 1;
        let mut answers = self.answers.lock();
        let answer = match answers.get_mut(predicate) {
            Some(seq) if seq.len() > 1 => seq.pop_front().unwrap(),
            Some(seq) => *seq.front().unwrap(),
            None => predicate != "loading",
        };
        Box::pin(async move { Ok(answer) })
    }

    fn action(&self, name: &'static str, detail: String) -> ClientFuture<'_, ()> {
        let entry = if detail.is_empty() {
            name.to_string()
        } else {
            format!("{} {}", name, detail)
        };
        self.calls.lock().push(entry);
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_on == Some(name) {
                return Err(ClientError::failed(name, "scripted failure"));
            }
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

impl Client for MockClient {
    fn title(&self) -> &str {
        &self.title
    }

    fn input_focus(&self) -> &tokio::sync::Mutex<()> {
        &self.input_focus
    }

    fn teleport(&self, position: Xyz) -> ClientFuture<'_, ()> {
        self.action("teleport", position.to_string())
    }

    fn tp_to_closest_by_name<'a>(&'a self, name: &'a str) -> ClientFuture<'a, ()> {
        self.action("tp_name", name.to_string())
    }

    fn tp_to_closest_by_vague_name<'a>(&'a self, name: &'a str) -> ClientFuture<'a, ()> {
        self.action("tp_vague", name.to_string())
    }

    fn tp_to_closest_mob(&self) -> ClientFuture<'_, ()> {
        self.action("tp_mob", String::new())
    }

    fn quest_position(&self) -> ClientFuture<'_, Xyz> {
        Box::pin(async { Ok(QUEST_POSITION) })
    }

    fn teleport_to_friend<'a>(&'a self, target: &'a FriendTarget) -> ClientFuture<'a, ()> {
        // Friend teleports must run with input focus held
        assert!(self.input_focus.try_lock().is_err(), "input focus not held");
        self.action("tp_friend", target.to_string())
    }

    fn goto(&self, x: f64, y: f64) -> ClientFuture<'_, ()> {
        self.action("goto", format!("{} {}", x, y))
    }

    fn send_key<'a>(&'a self, key: &'a str, seconds: f64) -> ClientFuture<'a, ()> {
        self.action("sendkey", format!("{} {}", key, seconds))
    }

    fn click(&self, x: i32, y: i32) -> ClientFuture<'_, ()> {
        self.action("click", format!("{} {}", x, y))
    }

    fn is_in_dialog(&self) -> ClientFuture<'_, bool> {
        self.answer("dialog")
    }

    fn in_battle(&self) -> ClientFuture<'_, bool> {
        self.answer("battle")
    }

    fn is_free(&self) -> ClientFuture<'_, bool> {
        self.answer("free")
    }

    fn is_loading(&self) -> ClientFuture<'_, bool> {
        self.answer("loading")
    }

    fn zone_name(&self) -> ClientFuture<'_, String> {
        *self.polls.lock().entry("zone").or_default() += 1;
        let mut zones = self.zones.lock();
        let zone = if zones.len() > 1 {
            zones.pop_front().unwrap()
        } else {
            zones.front().cloned().unwrap()
        };
        Box::pin(async move { Ok(zone) })
    }

    fn window_visible<'a>(&'a self, _path: &'a [String]) -> ClientFuture<'a, bool> {
        self.answer("window")
    }

    fn window_text<'a>(&'a self, path: &'a [String]) -> ClientFuture<'a, Option<String>> {
        let text = self.windows.get(&path.join("/")).cloned();
        Box::pin(async move { Ok(text) })
    }

    fn use_potion(&self) -> ClientFuture<'_, ()> {
        self.action("usepotion", String::new())
    }

    fn buy_potions(&self) -> ClientFuture<'_, ()> {
        self.action("buypotions", String::new())
    }

    fn relog(&self) -> ClientFuture<'_, ()> {
        self.action("relog", String::new())
    }

    fn to_zone<'a>(&'a self, path: &'a [String]) -> ClientFuture<'a, ()> {
        self.action("tozone", path.join("/"))
    }

    fn load_playstyle<'a>(&'a self, playstyle: &'a str) -> ClientFuture<'a, ()> {
        self.action("load_playstyle", playstyle.to_string())
    }
}

/* ===================== Building VMs ===================== */

/// Deserialize a JSON statement list and compile it
pub fn compile_json(ast: serde_json::Value) -> Program {
    let stmts: Vec<Stmt> = serde_json::from_value(ast).expect("AST deserialization failed");
    Compiler::compile(&stmts).expect("Compilation failed")
}

/// VM with the program loaded, driving `clients` and logging into the returned sink
pub fn build_vm(program: Program, clients: &[Arc<MockClient>]) -> (VM, Arc<MemorySink>) {
    let handles: Vec<Arc<dyn Client>> = clients
        .iter()
        .map(|c| Arc::clone(c) as Arc<dyn Client>)
        .collect();
    let sink = Arc::new(MemorySink::new());
    let mut vm = VM::new(handles).with_sink(sink.clone());
    vm.load(program);
    (vm, sink)
}

/// `build_vm` over a JSON AST
pub fn vm_from_json(ast: serde_json::Value, clients: &[Arc<MockClient>]) -> (VM, Arc<MemorySink>) {
    build_vm(compile_json(ast), clients)
}

/* ===================== AST Snippets ===================== */

pub fn cmd(kind: serde_json::Value) -> serde_json::Value {
    serde_json::json!({"type": "command", "command": {"kind": kind}})
}

pub fn cmd_for(selector: serde_json::Value, kind: serde_json::Value) -> serde_json::Value {
    serde_json::json!({"type": "command", "command": {"selector": selector, "kind": kind}})
}

pub fn sendkey(key: &str) -> serde_json::Value {
    cmd(serde_json::json!({"type": "sendkey", "key": {"type": "key", "key": key}}))
}

pub fn number(value: f64) -> serde_json::Value {
    serde_json::json!({"type": "number", "value": value})
}

pub fn var(ident: &str) -> serde_json::Value {
    serde_json::json!({"type": "var", "ident": ident})
}

pub fn predicate(predicate: serde_json::Value) -> serde_json::Value {
    serde_json::json!({"type": "command", "predicate": predicate})
}
