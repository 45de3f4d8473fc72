//! Client - the action-provider boundary
//!
//! A `Client` is one remotely-controlled game client. The VM never talks to a
//! game directly: every teleport, movement, key press and state query goes
//! through this trait. Handles are shared (`Arc<dyn Client>`) and never owned
//! or closed by the VM.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::ops::Neg;
use std::pin::Pin;
use thiserror::Error;

/// Future returned by every provider operation
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send + 'a>>;

/* ===================== Errors ===================== */

/// Failure reported by a provider operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("{operation} failed: {message}")]
    Failed {
        operation: &'static str,
        message: String,
    },

    #[error("client disconnected")]
    Disconnected,
}

impl ClientError {
    pub fn failed(operation: &'static str, message: impl Into<String>) -> Self {
        ClientError::Failed {
            operation,
            message: message.into(),
        }
    }
}

/* ===================== Positions ===================== */

/// World position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Neg for Xyz {
    type Output = Xyz;

    fn neg(self) -> Xyz {
        Xyz::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Xyz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Entry to teleport to from the friends list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriendTarget {
    /// Friend shown with a given icon (list, slot)
    Icon { list: u32, index: u32 },
    /// Friend with the given display name
    Name(String),
}

impl fmt::Display for FriendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FriendTarget::Icon { list, index } => write!(f, "icon {}:{}", list, index),
            FriendTarget::Name(name) => write!(f, "name {}", name),
        }
    }
}

/* ===================== Provider ===================== */

/// Operations the VM may invoke on a controlled client
///
/// Every operation may suspend and may fail. Implementations must tolerate
/// being driven by exactly one VM operation at a time; the VM does not lock
/// clients, except for `input_focus` around friend-list teleports.
pub trait Client: Send + Sync {
    /// Human-readable name used in logs
    fn title(&self) -> &str;

    /// Exclusive input (mouse/keyboard focus) for multi-step UI actions
    fn input_focus(&self) -> &tokio::sync::Mutex<()>;

    // Teleports
    fn teleport(&self, position: Xyz) -> ClientFuture<'_, ()>;
    fn tp_to_closest_by_name<'a>(&'a self, name: &'a str) -> ClientFuture<'a, ()>;
    fn tp_to_closest_by_vague_name<'a>(&'a self, name: &'a str) -> ClientFuture<'a, ()>;
    fn tp_to_closest_mob(&self) -> ClientFuture<'_, ()>;
    fn quest_position(&self) -> ClientFuture<'_, Xyz>;
    fn teleport_to_friend<'a>(&'a self, target: &'a FriendTarget) -> ClientFuture<'a, ()>;

    // Movement and input
    fn goto(&self, x: f64, y: f64) -> ClientFuture<'_, ()>;
    fn send_key<'a>(&'a self, key: &'a str, seconds: f64) -> ClientFuture<'a, ()>;
    fn click(&self, x: i32, y: i32) -> ClientFuture<'_, ()>;

    // State queries
    fn is_in_dialog(&self) -> ClientFuture<'_, bool>;
    fn in_battle(&self) -> ClientFuture<'_, bool>;
    fn is_free(&self) -> ClientFuture<'_, bool>;
    fn is_loading(&self) -> ClientFuture<'_, bool>;
    fn zone_name(&self) -> ClientFuture<'_, String>;
    fn window_visible<'a>(&'a self, path: &'a [String]) -> ClientFuture<'a, bool>;
    /// Text of the window at `path`, or `None` when no such window exists
    fn window_text<'a>(&'a self, path: &'a [String]) -> ClientFuture<'a, Option<String>>;

    // Utility actions
    fn use_potion(&self) -> ClientFuture<'_, ()>;
    fn buy_potions(&self) -> ClientFuture<'_, ()>;
    fn relog(&self) -> ClientFuture<'_, ()>;
    fn to_zone<'a>(&'a self, path: &'a [String]) -> ClientFuture<'a, ()>;
    fn load_playstyle<'a>(&'a self, playstyle: &'a str) -> ClientFuture<'a, ()>;
}
