//! Expression evaluation
//!
//! Predicates query clients one at a time, in client order, and stop at the
//! first client that answers false. An empty selection is vacuously true.

use super::probe::Probe;
use super::vm::VM;
use crate::client::Xyz;
use crate::interpreter::errors::VmError;
use crate::interpreter::types::{Expression, PlayerSelector, Predicate, UnaryOp, Value};
use futures::future::BoxFuture;

impl VM {
    /// Evaluate an expression to a value
    ///
    /// Boxed because expressions nest (`xyz`, unary operators).
    pub fn eval<'a>(&'a self, expr: &'a Expression) -> BoxFuture<'a, Result<Value, VmError>> {
        Box::pin(async move {
            match expr {
                Expression::Number { value } => Ok(Value::Number(*value)),
                Expression::String { value } => Ok(Value::String(value.clone())),
                Expression::Key { key } => Ok(Value::Key(key.clone())),

                Expression::Xyz { x, y, z } => Ok(Value::Xyz(Xyz::new(
                    self.eval_number(x, "xyz").await?,
                    self.eval_number(y, "xyz").await?,
                    self.eval_number(z, "xyz").await?,
                ))),

                Expression::Unary {
                    op: UnaryOp::Negate,
                    expr,
                } => match self.eval(expr).await? {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    Value::Xyz(p) => Ok(Value::Xyz(-p)),
                    other => Err(VmError::TypeMismatch {
                        context: "negation",
                        expected: "number or xyz",
                        found: other.type_name(),
                    }),
                },

                Expression::Unary {
                    op: UnaryOp::Not,
                    expr,
                } => Ok(Value::Bool(!self.eval_condition(expr).await?)),

                Expression::Command {
                    selector,
                    predicate,
                } => Ok(Value::Bool(self.eval_predicate(selector, predicate).await?)),

                Expression::Var { ident } => self
                    .vars
                    .get(ident)
                    .cloned()
                    .ok_or_else(|| VmError::UnknownVariable(ident.clone())),
            }
        })
    }

    /// Evaluate a condition of `jump_if`, `jump_ifn` or an until guard
    pub async fn eval_condition(&self, expr: &Expression) -> Result<bool, VmError> {
        let value = self.eval(expr).await?;
        value.truthiness().ok_or(VmError::TypeMismatch {
            context: "condition",
            expected: "bool or number",
            found: value.type_name(),
        })
    }

    pub(super) async fn eval_number(
        &self,
        expr: &Expression,
        context: &'static str,
    ) -> Result<f64, VmError> {
        match self.eval(expr).await? {
            Value::Number(n) => Ok(n),
            other => Err(VmError::TypeMismatch {
                context,
                expected: "number",
                found: other.type_name(),
            }),
        }
    }

    pub(super) async fn eval_xyz(
        &self,
        expr: &Expression,
        context: &'static str,
    ) -> Result<Xyz, VmError> {
        match self.eval(expr).await? {
            Value::Xyz(p) => Ok(p),
            other => Err(VmError::TypeMismatch {
                context,
                expected: "xyz",
                found: other.type_name(),
            }),
        }
    }

    /// Keys may be written as key literals or strings
    pub(super) async fn eval_key(&self, expr: &Expression) -> Result<String, VmError> {
        match self.eval(expr).await? {
            Value::Key(key) | Value::String(key) => Ok(key),
            other => Err(VmError::TypeMismatch {
                context: "sendkey",
                expected: "key",
                found: other.type_name(),
            }),
        }
    }

    /* ===================== Predicates ===================== */

    async fn eval_predicate(
        &self,
        selector: &PlayerSelector,
        predicate: &Predicate,
    ) -> Result<bool, VmError> {
        match predicate {
            Predicate::WindowVisible { path } => {
                self.all_selected(selector, Probe::WindowVisible(path)).await
            }
            Predicate::InZone { path } => {
                let zone = path.join("/");
                self.all_selected(selector, Probe::InZone(&zone)).await
            }
            Predicate::InBattle => self.all_selected(selector, Probe::Battle).await,
            Predicate::InDialog => self.all_selected(selector, Probe::Dialog).await,
            Predicate::SameZone { a, b } => {
                let a = self.player_by_num(*a)?;
                let b = self.player_by_num(*b)?;
                let zone_a = a
                    .zone_name()
                    .await
                    .map_err(|err| VmError::client(a.as_ref(), err))?;
                Probe::InZone(&zone_a).ask(b.as_ref()).await
            }
        }
    }

    async fn all_selected(&self, selector: &PlayerSelector, probe: Probe<'_>) -> Result<bool, VmError> {
        for client in self.select_players(selector) {
            if !probe.ask(client.as_ref()).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
