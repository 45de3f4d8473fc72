//! Abstract Syntax Tree node types
//!
//! The tree is produced by the deimoslang parser, which lives outside this
//! crate. Nodes are serde-tagged so a parsed script can be handed over as JSON.

use super::selector::PlayerSelector;
use serde::{Deserialize, Serialize};
use std::fmt;

/* ===================== Statements ===================== */

/// Statement AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stmt {
    List {
        stmts: Vec<Stmt>,
    },
    Command {
        command: Command,
    },
    BlockDef {
        ident: String,
        body: Vec<Stmt>,
    },
    If {
        expr: Expression,
        branch_true: Vec<Stmt>,
        #[serde(default)]
        branch_false: Vec<Stmt>,
    },
    While {
        expr: Expression,
        body: Vec<Stmt>,
    },
    Until {
        expr: Expression,
        body: Vec<Stmt>,
    },
    Loop {
        body: Vec<Stmt>,
    },
    Call {
        ident: String,
    },
    SetVar {
        ident: String,
        expr: Expression,
    },
    DecVar {
        ident: String,
    },
}

/// A command applied to a selection of clients
///
/// Commands without an explicit selector target every client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default = "PlayerSelector::all")]
    pub selector: PlayerSelector,
    pub kind: CommandKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CommandKind {
    Kill,
    Sleep {
        duration: Expression,
    },
    Log {
        output: LogOutput,
    },
    SendKey {
        key: Expression,
        #[serde(default)]
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
    #[serde(rename = "load_playstyle")]
    LoadPlaystyle {
        playstyle: String,
    },
    /// A predicate in statement position; it has no lowering
    Expr {
        predicate: Predicate,
    },
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Kill => "kill",
            CommandKind::Sleep { .. } => "sleep",
            CommandKind::Log { .. } => "log",
            CommandKind::SendKey { .. } => "sendkey",
            CommandKind::Click { .. } => "click",
            CommandKind::Teleport { .. } => "teleport",
            CommandKind::Goto { .. } => "goto",
            CommandKind::UsePotion => "usepotion",
            CommandKind::BuyPotions => "buypotions",
            CommandKind::Relog => "relog",
            CommandKind::ToZone { .. } => "tozone",
            CommandKind::Waitfor(_) => "waitfor",
            CommandKind::LoadPlaystyle { .. } => "load_playstyle",
            CommandKind::Expr { .. } => "expr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogOutput {
    Literal { tokens: Vec<LogToken> },
    Window { path: Vec<String> },
}

/// One word of a `log` line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum LogToken {
    String(String),
    Ident(String),
}

impl LogToken {
    pub fn text(&self) -> &str {
        match self {
            LogToken::String(s) | LogToken::Ident(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TeleportTarget {
    Position { position: Expression },
    EntityLiteral { name: String },
    EntityVague { name: String },
    Mob,
    Quest,
    FriendIcon,
    FriendName { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitforCommand {
    pub kind: WaitforKind,
    /// Also wait for the condition to go away again
    #[serde(default)]
    pub completion: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WaitforKind {
    Dialog,
    Battle,
    Free,
    ZoneChange,
    Window { path: Vec<String> },
}

/* ===================== Expressions ===================== */

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    Number {
        value: f64,
    },
    String {
        value: String,
    },
    Key {
        key: String,
    },
    Xyz {
        x: Box<Expression>,
        y: Box<Expression>,
        z: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expression>,
    },
    /// Boolean predicate evaluated against the selected clients
    Command {
        #[serde(default = "PlayerSelector::all")]
        selector: PlayerSelector,
        predicate: Predicate,
    },
    Var {
        ident: String,
    },
}

impl Expression {
    pub fn number(value: f64) -> Self {
        Expression::Number { value }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Expression::Xyz {
            x: Box::new(Expression::number(x)),
            y: Box::new(Expression::number(y)),
            z: Box::new(Expression::number(z)),
        }
    }

    pub fn var(ident: impl Into<String>) -> Self {
        Expression::Var {
            ident: ident.into(),
        }
    }

    pub fn not(expr: Expression) -> Self {
        Expression::Unary {
            op: UnaryOp::Not,
            expr: Box::new(expr),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    WindowVisible { path: Vec<String> },
    InZone { path: Vec<String> },
    /// Players are numbered from 1
    SameZone { a: usize, b: usize },
    InBattle,
    InDialog,
}

/* ===================== Debug Form ===================== */

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number { value } => write!(f, "{}", value),
            Expression::String { value } => write!(f, "{:?}", value),
            Expression::Key { key } => write!(f, "{}", key),
            Expression::Xyz { x, y, z } => write!(f, "xyz({}, {}, {})", x, y, z),
            Expression::Unary {
                op: UnaryOp::Negate,
                expr,
            } => write!(f, "-{}", expr),
            Expression::Unary {
                op: UnaryOp::Not,
                expr,
            } => write!(f, "not {}", expr),
            Expression::Command {
                selector,
                predicate,
            } => write!(f, "{} {}", selector, predicate),
            Expression::Var { ident } => write!(f, "${}", ident),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::WindowVisible { path } => write!(f, "window_visible {}", path.join("/")),
            Predicate::InZone { path } => write!(f, "in_zone {}", path.join("/")),
            Predicate::SameZone { a, b } => write!(f, "same_zone {} {}", a, b),
            Predicate::InBattle => write!(f, "in_battle"),
            Predicate::InDialog => write!(f, "in_dialog"),
        }
    }
}

impl fmt::Display for TeleportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeleportTarget::Position { position } => write!(f, "{}", position),
            TeleportTarget::EntityLiteral { name } => write!(f, "entity {:?}", name),
            TeleportTarget::EntityVague { name } => write!(f, "entity_vague {:?}", name),
            TeleportTarget::Mob => write!(f, "mob"),
            TeleportTarget::Quest => write!(f, "quest"),
            TeleportTarget::FriendIcon => write!(f, "friend_icon"),
            TeleportTarget::FriendName { name } => write!(f, "friend_name {:?}", name),
        }
    }
}

impl fmt::Display for WaitforCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WaitforKind::Dialog => write!(f, "dialog")?,
            WaitforKind::Battle => write!(f, "battle")?,
            WaitforKind::Free => write!(f, "free")?,
            WaitforKind::ZoneChange => write!(f, "zonechange")?,
            WaitforKind::Window { path } => write!(f, "window {}", path.join("/"))?,
        }
        if self.completion {
            write!(f, " completion")?;
        }
        Ok(())
    }
}

impl fmt::Display for LogToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogToken::String(s) => write!(f, "{:?}", s),
            LogToken::Ident(s) => write!(f, "{}", s),
        }
    }
}
