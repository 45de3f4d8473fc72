//! Teleport variants

use super::{fan_out, on_client};
use crate::client::{Client, FriendTarget};
use crate::interpreter::errors::VmError;
use crate::interpreter::executor::vm::VM;
use crate::interpreter::types::TeleportTarget;
use std::sync::Arc;

/// Friend shown in the first slot of the "teleport to" icon list
pub const FRIEND_ICON: FriendTarget = FriendTarget::Icon { list: 2, index: 0 };

impl VM {
    pub(crate) async fn teleport(
        &self,
        clients: &[Arc<dyn Client>],
        target: &TeleportTarget,
    ) -> Result<(), VmError> {
        match target {
            TeleportTarget::Position { position } => {
                // Positions are evaluated per client before any teleport starts
                let mut ops = Vec::with_capacity(clients.len());
                for c in clients {
                    let pos = self.eval_xyz(position, "teleport").await?;
                    ops.push(on_client(c.as_ref(), c.teleport(pos)));
                }
                fan_out(ops).await?;
            }

            TeleportTarget::EntityLiteral { name } => {
                fan_out(
                    clients
                        .iter()
                        .map(|c| on_client(c.as_ref(), c.tp_to_closest_by_name(name))),
                )
                .await?;
            }

            TeleportTarget::EntityVague { name } => {
                fan_out(
                    clients
                        .iter()
                        .map(|c| on_client(c.as_ref(), c.tp_to_closest_by_vague_name(name))),
                )
                .await?;
            }

            TeleportTarget::Mob => {
                fan_out(clients.iter().map(|c| on_client(c.as_ref(), c.tp_to_closest_mob())))
                    .await?;
            }

            TeleportTarget::Quest => {
                fan_out(clients.iter().map(|c| async move {
                    let pos = on_client(c.as_ref(), c.quest_position()).await?;
                    on_client(c.as_ref(), c.teleport(pos)).await
                }))
                .await?;
            }

            TeleportTarget::FriendIcon => friend_teleport(clients, &FRIEND_ICON).await?,

            TeleportTarget::FriendName { name } => {
                friend_teleport(clients, &FriendTarget::Name(name.clone())).await?
            }
        }
        Ok(())
    }
}

/// Friend-list teleports drive the UI, so each client's input focus is held throughout
async fn friend_teleport(clients: &[Arc<dyn Client>], target: &FriendTarget) -> Result<(), VmError> {
    fan_out(clients.iter().map(|c| async move {
        let _focus = c.input_focus().lock().await;
        on_client(c.as_ref(), c.teleport_to_friend(target)).await
    }))
    .await?;
    Ok(())
}
