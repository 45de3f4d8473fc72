//! Action implementations behind `deimos_call`, `load_playstyle` and `log_window`
//!
//! Every action that targets several clients runs one operation per client
//! concurrently and joins them. The first failure wins: it is returned and
//! the still-pending siblings are dropped, which cancels them.

pub mod teleport;
pub mod waitfor;

use super::vm::VM;
use crate::client::{Client, ClientFuture};
use crate::interpreter::errors::VmError;
use crate::interpreter::types::{DeimosCall, PlayerSelector};
use futures::future::try_join_all;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Hold time for `sendkey` without an explicit duration
pub const DEFAULT_KEY_SECONDS: f64 = 0.1;

/* ===================== Fan-out ===================== */

/// Run per-client operations concurrently, failing fast
///
/// Results come back in the order the operations were given.
pub async fn fan_out<I, F, T>(ops: I) -> Result<Vec<T>, VmError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, VmError>>,
{
    try_join_all(ops).await
}

/// Await a provider call, tagging a failure with the client's title
pub async fn on_client<T>(client: &dyn Client, op: ClientFuture<'_, T>) -> Result<T, VmError> {
    op.await.map_err(|err| VmError::client(client, err))
}

/// Script seconds as a `Duration`; negative, NaN and oversized values are rejected
pub(super) fn duration_from_secs(
    seconds: f64,
    instruction: &'static str,
) -> Result<Duration, VmError> {
    Duration::try_from_secs_f64(seconds).map_err(|_| VmError::InvalidOperand {
        instruction,
        reason: format!("expected a non-negative duration, got {}", seconds),
    })
}

/// Screen coordinate rounded to the nearest pixel
fn coordinate(value: f64) -> Result<i32, VmError> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < f64::from(i32::MIN) || rounded > f64::from(i32::MAX) {
        return Err(VmError::InvalidOperand {
            instruction: "click",
            reason: format!("coordinate {} is out of range", value),
        });
    }
    Ok(rounded as i32)
}

/* ===================== Dispatcher ===================== */

impl VM {
    /// Run one action against the selected clients
    pub(super) async fn exec_deimos_call(
        &self,
        selector: &PlayerSelector,
        call: &DeimosCall,
    ) -> Result<(), VmError> {
        let clients = self.select_players(selector);
        debug!(action = call.name(), %selector, clients = clients.len(), "deimos call");

        match call {
            DeimosCall::SendKey { key, seconds } => {
                let key = self.eval_key(key).await?;
                let seconds = match seconds {
                    Some(seconds) => self.eval_number(seconds, "sendkey").await?,
                    None => DEFAULT_KEY_SECONDS,
                };
                duration_from_secs(seconds, "sendkey")?;
                fan_out(
                    clients
                        .iter()
                        .map(|c| on_client(c.as_ref(), c.send_key(&key, seconds))),
                )
                .await?;
            }

            DeimosCall::Click { x, y } => {
                let x = coordinate(self.eval_number(x, "click").await?)?;
                let y = coordinate(self.eval_number(y, "click").await?)?;
                fan_out(clients.iter().map(|c| on_client(c.as_ref(), c.click(x, y)))).await?;
            }

            DeimosCall::Teleport { target } => self.teleport(&clients, target).await?,

            DeimosCall::Goto { target } => {
                let mut ops = Vec::with_capacity(clients.len());
                for c in &clients {
                    let pos = self.eval_xyz(target, "goto").await?;
                    ops.push(on_client(c.as_ref(), c.goto(pos.x, pos.y)));
                }
                fan_out(ops).await?;
            }

            DeimosCall::UsePotion => {
                fan_out(clients.iter().map(|c| on_client(c.as_ref(), c.use_potion()))).await?;
            }
            DeimosCall::BuyPotions => {
                fan_out(clients.iter().map(|c| on_client(c.as_ref(), c.buy_potions()))).await?;
            }
            DeimosCall::Relog => {
                fan_out(clients.iter().map(|c| on_client(c.as_ref(), c.relog()))).await?;
            }

            DeimosCall::ToZone { path } => {
                fan_out(clients.iter().map(|c| on_client(c.as_ref(), c.to_zone(path)))).await?;
            }

            DeimosCall::Waitfor(wait) => self.waitfor(&clients, wait).await?,
        }
        Ok(())
    }

    pub(super) async fn load_playstyle(
        &self,
        selector: &PlayerSelector,
        playstyle: &str,
    ) -> Result<(), VmError> {
        let clients = self.select_players(selector);
        fan_out(
            clients
                .iter()
                .map(|c| on_client(c.as_ref(), c.load_playstyle(playstyle))),
        )
        .await?;
        Ok(())
    }

    /// Fetch a window's text from every selected client, then log it in client order
    pub(super) async fn log_window(
        &self,
        selector: &PlayerSelector,
        path: &[String],
    ) -> Result<(), VmError> {
        let clients = self.select_players(selector);
        let texts = fan_out(clients.iter().map(|c| async move {
            on_client(c.as_ref(), c.window_text(path))
                .await?
                .ok_or_else(|| VmError::WindowNotFound(path.join("/")))
        }))
        .await?;

        for (client, text) in clients.iter().zip(texts) {
            self.sink().log(&format!("{} - {}", client.title(), text));
        }
        Ok(())
    }
}
