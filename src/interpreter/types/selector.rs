//! Player selectors
//!
//! A selector picks the subset of clients one instruction applies to.
//! Indices are 0-based positions in the VM's ordered client list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Chooses which clients an instruction targets
///
/// - `mass`: every client, regardless of `player_nums`
/// - otherwise: clients whose index is in `player_nums`, or, when `inverted`,
///   every client whose index is NOT in `player_nums`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSelector {
    #[serde(default)]
    pub mass: bool,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub player_nums: BTreeSet<usize>,
}

impl PlayerSelector {
    /// Selector matching every client
    pub fn all() -> Self {
        Self {
            mass: true,
            ..Self::default()
        }
    }

    /// Selector matching exactly the given client indices
    pub fn players(nums: impl IntoIterator<Item = usize>) -> Self {
        Self {
            player_nums: nums.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Selector matching every client except the given indices
    pub fn except(nums: impl IntoIterator<Item = usize>) -> Self {
        Self {
            inverted: true,
            player_nums: nums.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Whether the client at `index` is selected
    pub fn includes(&self, index: usize) -> bool {
        self.mass || (self.player_nums.contains(&index) != self.inverted)
    }

    /// Resolve the selector against an ordered list
    ///
    /// Never fails: an out-of-range index simply matches nothing, and the
    /// result may be empty. Order of the input is preserved.
    pub fn select<'a, T>(&self, items: &'a [T]) -> Vec<&'a T> {
        items
            .iter()
            .enumerate()
            .filter(|(i, _)| self.includes(*i))
            .map(|(_, item)| item)
            .collect()
    }
}

impl fmt::Display for PlayerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mass {
            return write!(f, "mass");
        }
        let nums: Vec<String> = self.player_nums.iter().map(|n| format!("p{}", n)).collect();
        if self.inverted {
            write!(f, "except[{}]", nums.join(","))
        } else {
            write!(f, "[{}]", nums.join(","))
        }
    }
}
