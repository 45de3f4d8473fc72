//! Dry-run client
//!
//! An in-process `Client` that performs nothing: every action is logged, and
//! queries get scripted answers so any script can run to completion without
//! a game. Used by `deimos dry-run`.

use crate::client::{Client, ClientError, ClientFuture, FriendTarget, Xyz};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

pub const HOME_ZONE: &str = "WizardCity/WC_Hub";
pub const AWAY_ZONE: &str = "WizardCity/WC_Streets/Interiors/WC_Bartleby";

/// Answers queries predictably:
/// - boolean predicates alternate true, false, true, ... (shared sequence)
/// - the zone name alternates between `HOME_ZONE` and `AWAY_ZONE`
/// - a window's text is its own path, `/`-joined
pub struct DryRunClient {
    title: String,
    input_focus: tokio::sync::Mutex<()>,
    flips: AtomicU64,
    zone_queries: AtomicU64,
    actions: AtomicU64,
}

impl DryRunClient {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            input_focus: tokio::sync::Mutex::new(()),
            flips: AtomicU64::new(0),
            zone_queries: AtomicU64::new(0),
            actions: AtomicU64::new(0),
        }
    }

    /// Number of actions performed so far
    pub fn actions(&self) -> u64 {
        self.actions.load(Ordering::Relaxed)
    }

    fn flip(&self) -> bool {
        self.flips.fetch_add(1, Ordering::Relaxed) % 2 == 0
    }

    fn act(&self, action: String) -> ClientFuture<'_, ()> {
        self.actions.fetch_add(1, Ordering::Relaxed);
        info!(client = %self.title, "{}", action);
        answer(())
    }
}

fn answer<'a, T: Send + 'a>(value: T) -> ClientFuture<'a, T> {
    Box::pin(async move { Ok(value) })
}

impl Client for DryRunClient {
    fn title(&self) -> &str {
        &self.title
    }

    fn input_focus(&self) -> &tokio::sync::Mutex<()> {
        &self.input_focus
    }

    fn teleport(&self, position: Xyz) -> ClientFuture<'_, ()> {
        self.act(format!("teleport to {}", position))
    }

    fn tp_to_closest_by_name<'a>(&'a self, name: &'a str) -> ClientFuture<'a, ()> {
        self.act(format!("teleport to closest entity {:?}", name))
    }

    fn tp_to_closest_by_vague_name<'a>(&'a self, name: &'a str) -> ClientFuture<'a, ()> {
        self.act(format!("teleport to closest entity like {:?}", name))
    }

    fn tp_to_closest_mob(&self) -> ClientFuture<'_, ()> {
        self.act("teleport to closest mob".to_string())
    }

    fn quest_position(&self) -> ClientFuture<'_, Xyz> {
        answer(Xyz::default())
    }

    fn teleport_to_friend<'a>(&'a self, target: &'a FriendTarget) -> ClientFuture<'a, ()> {
        self.act(format!("teleport to friend {}", target))
    }

    fn goto(&self, x: f64, y: f64) -> ClientFuture<'_, ()> {
        self.act(format!("goto ({}, {})", x, y))
    }

    fn send_key<'a>(&'a self, key: &'a str, seconds: f64) -> ClientFuture<'a, ()> {
        self.actions.fetch_add(1, Ordering::Relaxed);
        info!(client = %self.title, "send key {} for {}s", key, seconds);
        Box::pin(async move {
            let hold = Duration::try_from_secs_f64(seconds)
                .map_err(|err| ClientError::failed("send_key", err.to_string()))?;
            tokio::time::sleep(hold).await;
            Ok(())
        })
    }

    fn click(&self, x: i32, y: i32) -> ClientFuture<'_, ()> {
        self.act(format!("click ({}, {})", x, y))
    }

    fn is_in_dialog(&self) -> ClientFuture<'_, bool> {
        answer(self.flip())
    }

    fn in_battle(&self) -> ClientFuture<'_, bool> {
        answer(self.flip())
    }

    fn is_free(&self) -> ClientFuture<'_, bool> {
        answer(self.flip())
    }

    fn is_loading(&self) -> ClientFuture<'_, bool> {
        answer(self.flip())
    }

    fn zone_name(&self) -> ClientFuture<'_, String> {
        let home = self.zone_queries.fetch_add(1, Ordering::Relaxed) % 2 == 0;
        let zone = if home { HOME_ZONE } else { AWAY_ZONE };
        answer(zone.to_string())
    }

    fn window_visible<'a>(&'a self, _path: &'a [String]) -> ClientFuture<'a, bool> {
        answer(self.flip())
    }

    fn window_text<'a>(&'a self, path: &'a [String]) -> ClientFuture<'a, Option<String>> {
        answer(Some(path.join("/")))
    }

    fn use_potion(&self) -> ClientFuture<'_, ()> {
        self.act("use potion".to_string())
    }

    fn buy_potions(&self) -> ClientFuture<'_, ()> {
        self.act("buy potions".to_string())
    }

    fn relog(&self) -> ClientFuture<'_, ()> {
        self.act("relog".to_string())
    }

    fn to_zone<'a>(&'a self, path: &'a [String]) -> ClientFuture<'a, ()> {
        self.act(format!("go to zone {}", path.join("/")))
    }

    fn load_playstyle<'a>(&'a self, playstyle: &'a str) -> ClientFuture<'a, ()> {
        self.act(format!("load playstyle {:?}", playstyle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_predicates_alternate() {
        let client = DryRunClient::new("p1");
        assert!(client.in_battle().await.unwrap());
        assert!(!client.is_in_dialog().await.unwrap());
        assert!(client.is_free().await.unwrap());
    }

    #[tokio::test]
    async fn test_zone_alternates() {
        let client = DryRunClient::new("p1");
        assert_eq!(client.zone_name().await.unwrap(), HOME_ZONE);
        assert_eq!(client.zone_name().await.unwrap(), AWAY_ZONE);
        assert_eq!(client.zone_name().await.unwrap(), HOME_ZONE);
    }

    #[tokio::test]
    async fn test_actions_are_counted() {
        let client = DryRunClient::new("p1");
        client.use_potion().await.unwrap();
        client.click(10, 20).await.unwrap();
        let path = vec!["a".to_string(), "b".to_string()];
        assert_eq!(client.window_text(&path).await.unwrap().as_deref(), Some("a/b"));
        assert_eq!(client.actions(), 2);
    }

    #[tokio::test]
    async fn test_send_key_rejects_unrepresentable_hold() {
        let client = DryRunClient::new("p1");
        assert!(matches!(
            client.send_key("A", 1e20).await,
            Err(ClientError::Failed {
                operation: "send_key",
                ..
            })
        ));
        assert!(client.send_key("A", -1.0).await.is_err());
    }
}
