//! Boolean questions asked of a single client
//!
//! Shared by predicate expressions and `waitfor` polling.

use crate::client::Client;
use crate::interpreter::errors::VmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe<'a> {
    Dialog,
    Battle,
    Free,
    Loading,
    WindowVisible(&'a [String]),
    /// Zone name equals the given `/`-joined path
    InZone(&'a str),
}

impl Probe<'_> {
    pub(crate) async fn ask(self, client: &dyn Client) -> Result<bool, VmError> {
        let answer = match self {
            Probe::Dialog => client.is_in_dialog().await,
            Probe::Battle => client.in_battle().await,
            Probe::Free => client.is_free().await,
            Probe::Loading => client.is_loading().await,
            Probe::WindowVisible(path) => client.window_visible(path).await,
            Probe::InZone(zone) => client.zone_name().await.map(|name| name == zone),
        };
        answer.map_err(|err| VmError::client(client, err))
    }
}
