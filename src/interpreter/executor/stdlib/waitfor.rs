//! `waitfor` polling
//!
//! Each client is polled on its own: ask, and if the answer is not the one
//! wanted yet, sleep one poll interval and ask again. With `completion`, a
//! second phase waits for the opposite answer once the first one is seen.

use super::{fan_out, on_client};
use crate::client::Client;
use crate::interpreter::errors::VmError;
use crate::interpreter::executor::probe::Probe;
use crate::interpreter::executor::vm::VM;
use crate::interpreter::types::{WaitforCommand, WaitforKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

impl VM {
    pub(crate) async fn waitfor(
        &self,
        clients: &[Arc<dyn Client>],
        wait: &WaitforCommand,
    ) -> Result<(), VmError> {
        let interval = self.poll_interval();
        let completion = wait.completion;

        let probe = match &wait.kind {
            WaitforKind::Dialog => Probe::Dialog,
            WaitforKind::Battle => Probe::Battle,
            WaitforKind::Free => Probe::Free,
            WaitforKind::Window { path } => Probe::WindowVisible(path),
            WaitforKind::ZoneChange => return wait_zone_change(clients, completion, interval).await,
        };

        fan_out(clients.iter().map(|c| async move {
            poll_until(c.as_ref(), probe, true, interval).await?;
            if completion {
                poll_until(c.as_ref(), probe, false, interval).await?;
            }
            Ok::<_, VmError>(())
        }))
        .await?;
        Ok(())
    }
}

/// Poll `probe` until it answers `expected`
pub(crate) async fn poll_until(
    client: &dyn Client,
    probe: Probe<'_>,
    expected: bool,
    interval: Duration,
) -> Result<(), VmError> {
    while probe.ask(client).await? != expected {
        trace!(client = client.title(), ?probe, expected, "waiting");
        tokio::time::sleep(interval).await;
    }
    Ok(())
}

/// Wait until every client leaves the zone it was in when the wait began
///
/// The completion phase waits for loading to finish, in a second join group.
async fn wait_zone_change(
    clients: &[Arc<dyn Client>],
    completion: bool,
    interval: Duration,
) -> Result<(), VmError> {
    let mut start_zones = Vec::with_capacity(clients.len());
    for c in clients {
        start_zones.push(on_client(c.as_ref(), c.zone_name()).await?);
    }

    fan_out(
        clients
            .iter()
            .zip(&start_zones)
            .map(|(c, start)| poll_until(c.as_ref(), Probe::InZone(start), false, interval)),
    )
    .await?;

    if completion {
        fan_out(
            clients
                .iter()
                .map(|c| poll_until(c.as_ref(), Probe::Loading, false, interval)),
        )
        .await?;
    }
    Ok(())
}
