//! Tests for the compiler lowerings

use super::compiler::Compiler;
use super::errors::CompileError;
use super::types::*;
use serde_json::json;

fn compile(ast: serde_json::Value) -> Result<Program, CompileError> {
    let stmts: Vec<Stmt> = serde_json::from_value(ast).expect("AST deserialization failed");
    Compiler::compile(&stmts)
}

fn kinds(program: &Program) -> Vec<&'static str> {
    program.iter().map(|i| i.kind().name()).collect()
}

fn in_battle() -> serde_json::Value {
    json!({"type": "command", "predicate": {"type": "in_battle"}})
}

fn sendkey(key: &str) -> serde_json::Value {
    json!({"type": "command", "command": {"kind": {"type": "sendkey", "key": {"type": "key", "key": key}}}})
}

#[test]
fn test_simple_commands() {
    let program = compile(json!([
        {"type": "command", "command": {"kind": {"type": "sleep", "duration": {"type": "number", "value": 1.5}}}},
        {"type": "command", "command": {"kind": {"type": "log", "output": {"kind": "literal", "tokens": [{"t": "string", "v": "hello"}]}}}},
        {"type": "command", "command": {"kind": {"type": "kill"}}}
    ]))
    .unwrap();

    assert_eq!(
        program.instructions(),
        &[
            Instruction::Sleep(Expression::number(1.5)),
            Instruction::LogLiteral(vec![LogToken::String("hello".into())]),
            Instruction::Kill,
        ]
    );
}

#[test]
fn test_actions_emit_deimos_call() {
    let program = compile(json!([
        {"type": "command", "command": {
            "selector": {"player_nums": [1]},
            "kind": {"type": "teleport", "target": {"type": "mob"}}
        }},
        {"type": "command", "command": {"kind": {"type": "tozone", "path": ["WizardCity", "WC_Hub"]}}},
        {"type": "command", "command": {"kind": {"type": "load_playstyle", "playstyle": "pass"}}}
    ]))
    .unwrap();

    assert_eq!(
        program[0],
        Instruction::DeimosCall {
            selector: PlayerSelector::players([1]),
            call: DeimosCall::Teleport {
                target: TeleportTarget::Mob
            },
        }
    );
    assert_eq!(
        program[1],
        Instruction::DeimosCall {
            selector: PlayerSelector::all(),
            call: DeimosCall::ToZone {
                path: vec!["WizardCity".into(), "WC_Hub".into()]
            },
        }
    );
    assert_eq!(
        program[2],
        Instruction::LoadPlaystyle {
            selector: PlayerSelector::all(),
            playstyle: "pass".into(),
        }
    );
}

#[test]
fn test_block_def_layout() {
    let program = compile(json!([
        {"type": "block_def", "ident": "heal", "body": [sendkey("H"), sendkey("J")]},
        {"type": "call", "ident": "heal"}
    ]))
    .unwrap();

    assert_eq!(
        kinds(&program),
        vec!["jump", "label", "deimos_call", "deimos_call", "ret", "nop", "call", "nop"]
    );
    // B = 2, skips label, body, ret and lands on the trailing nop
    assert_eq!(program[0], Instruction::Jump(5));
    assert_eq!(program.jump_target(0, 5), Some(5));
    assert_eq!(program[5], Instruction::Nop);
}

#[test]
fn test_if_layout() {
    let program = compile(json!([{
        "type": "if",
        "expr": in_battle(),
        "branch_true": [sendkey("A")],
        "branch_false": [sendkey("B"), sendkey("C")]
    }]))
    .unwrap();

    assert_eq!(
        kinds(&program),
        vec!["jump_if", "deimos_call", "deimos_call", "jump", "deimos_call", "nop"]
    );
    assert_eq!(program[0].jump_offset(), Some(4)); // F + 2
    assert_eq!(program[3], Instruction::Jump(2)); // T + 1
}

#[test]
fn test_if_without_else() {
    let program = compile(json!([{
        "type": "if",
        "expr": in_battle(),
        "branch_true": [sendkey("A")]
    }]))
    .unwrap();

    assert_eq!(kinds(&program), vec!["jump_if", "jump", "deimos_call", "nop"]);
    assert_eq!(program[0].jump_offset(), Some(2));
    assert_eq!(program[1], Instruction::Jump(2));
}

#[test]
fn test_while_layout() {
    let program = compile(json!([{
        "type": "while",
        "expr": in_battle(),
        "body": [sendkey("A"), sendkey("B"), sendkey("C")]
    }]))
    .unwrap();

    assert_eq!(
        kinds(&program),
        vec!["jump_ifn", "deimos_call", "deimos_call", "deimos_call", "jump_if", "nop"]
    );
    assert_eq!(program[0].jump_offset(), Some(5)); // B + 2
    assert_eq!(program[4].jump_offset(), Some(-3)); // back to body start
    assert_eq!(program.jump_target(4, -3), Some(1));
}

#[test]
fn test_until_layout() {
    let program = compile(json!([{
        "type": "until",
        "expr": in_battle(),
        "body": [sendkey("A"), sendkey("B")]
    }]))
    .unwrap();

    assert_eq!(
        kinds(&program),
        vec!["enter_until", "deimos_call", "deimos_call", "jump", "nop"]
    );
    assert_eq!(program[0].jump_offset(), Some(4));
    assert_eq!(program[3], Instruction::Jump(-2));
}

#[test]
fn test_loop_layout() {
    let program = compile(json!([
        {"type": "loop", "body": [sendkey("A"), sendkey("B")]}
    ]))
    .unwrap();

    assert_eq!(kinds(&program), vec!["deimos_call", "deimos_call", "jump"]);
    assert_eq!(program[2], Instruction::Jump(-2));
}

#[test]
fn test_nested_offsets_use_emitted_lengths() {
    // An if inside a while: the inner if lowers to 4 instructions
    let program = compile(json!([{
        "type": "while",
        "expr": in_battle(),
        "body": [{"type": "if", "expr": in_battle(), "branch_true": [sendkey("A")]}]
    }]))
    .unwrap();

    assert_eq!(program.len(), 7);
    assert_eq!(program[0].jump_offset(), Some(6));
    assert_eq!(program[5].jump_offset(), Some(-4));
    assert!(program.validate().is_ok());
}

#[test]
fn test_waitfor_completion_emits_two_calls() {
    let program = compile(json!([{
        "type": "command",
        "command": {"kind": {"type": "waitfor", "kind": {"type": "dialog"}, "completion": true}}
    }]))
    .unwrap();

    let waits: Vec<&WaitforCommand> = program
        .iter()
        .map(|instr| match instr {
            Instruction::DeimosCall {
                call: DeimosCall::Waitfor(wait),
                ..
            } => wait,
            other => panic!("unexpected instruction {}", other),
        })
        .collect();

    assert_eq!(waits.len(), 2);
    assert!(!waits[0].completion);
    assert!(waits[1].completion);
    assert_eq!(waits[0].kind, WaitforKind::Dialog);
    assert_eq!(waits[1].kind, WaitforKind::Dialog);
}

#[test]
fn test_waitfor_without_completion_emits_one_call() {
    let program = compile(json!([{
        "type": "command",
        "command": {"kind": {"type": "waitfor", "kind": {"type": "window", "path": ["a", "b"]}}}
    }]))
    .unwrap();

    assert_eq!(program.len(), 1);
    assert_eq!(program[0].to_string(), "deimos_call mass waitfor window a/b");
}

#[test]
fn test_zonechange_completion_is_split_too() {
    let program = compile(json!([{
        "type": "command",
        "command": {"kind": {"type": "waitfor", "kind": {"type": "zonechange"}, "completion": true}}
    }]))
    .unwrap();

    assert_eq!(
        program.to_string(),
        "0000 deimos_call mass waitfor zonechange\n0001 deimos_call mass waitfor zonechange completion\n"
    );
}

#[test]
fn test_variables() {
    let program = compile(json!([
        {"type": "set_var", "ident": "n", "expr": {"type": "number", "value": 3.0}},
        {"type": "dec_var", "ident": "n"}
    ]))
    .unwrap();

    assert_eq!(
        program.instructions(),
        &[
            Instruction::SetVar {
                ident: "n".into(),
                expr: Expression::number(3.0)
            },
            Instruction::DecVar("n".into()),
        ]
    );
}

#[test]
fn test_predicate_statement_is_rejected() {
    let result = compile(json!([{
        "type": "command",
        "command": {"kind": {"type": "expr", "predicate": {"type": "in_dialog"}}}
    }]));

    assert_eq!(result, Err(CompileError::UnsupportedCommand("expr".into())));
}

#[test]
fn test_call_before_block_is_rejected() {
    let result = compile(json!([
        {"type": "call", "ident": "later"},
        {"type": "block_def", "ident": "later", "body": []}
    ]));

    assert_eq!(
        result,
        Err(CompileError::UnresolvedLabel {
            at: 0,
            label: "later".into()
        })
    );
}

#[test]
fn test_debug_form() {
    let program = compile(json!([{
        "type": "if",
        "expr": {"type": "command", "selector": {"player_nums": [0]}, "predicate": {"type": "window_visible", "path": ["X"]}},
        "branch_true": [sendkey("A")],
        "branch_false": [sendkey("B")]
    }]))
    .unwrap();

    let expected = "\
0000 jump_if [p0] window_visible X, 3
0001 deimos_call mass sendkey B
0002 jump 2
0003 deimos_call mass sendkey A
0004 nop
";
    assert_eq!(program.to_string(), expected);
}

#[test]
fn test_compile_is_deterministic() {
    let ast = json!([
        {"type": "block_def", "ident": "a", "body": [sendkey("A")]},
        {"type": "loop", "body": [{"type": "call", "ident": "a"}]}
    ]);

    let first = compile(ast.clone()).unwrap();
    let second = compile(ast).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.fingerprint(), second.fingerprint());
}
