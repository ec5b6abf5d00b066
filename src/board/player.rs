//! Players (factions) and diplomacy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identifier of a player. The neutral player owns unclaimed cities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

/// A faction taking part in the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub gold: u32,
    pub neutral: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, gold: u32) -> Self {
        Player {
            id,
            name: name.to_string(),
            gold,
            neutral: false,
        }
    }

    pub fn neutral(id: PlayerId) -> Self {
        Player {
            id,
            name: "Neutral".to_string(),
            gold: 0,
            neutral: true,
        }
    }
}

/// Pairwise war state between non-neutral players.
///
/// When diplomacy is disabled every pair of players is permanently at war.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diplomacy {
    pub enabled: bool,
    wars: BTreeSet<(PlayerId, PlayerId)>,
}

impl Diplomacy {
    pub fn new(enabled: bool) -> Self {
        Diplomacy {
            enabled,
            wars: BTreeSet::new(),
        }
    }

    fn key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn at_war(&self, a: PlayerId, b: PlayerId) -> bool {
        if a == b {
            return false;
        }
        !self.enabled || self.wars.contains(&Self::key(a, b))
    }

    /// Records a war between two players. Returns false if they already were.
    pub fn declare_war(&mut self, a: PlayerId, b: PlayerId) -> bool {
        if a == b || self.at_war(a, b) {
            return false;
        }
        self.wars.insert(Self::key(a, b))
    }

    pub fn make_peace(&mut self, a: PlayerId, b: PlayerId) {
        self.wars.remove(&Self::key(a, b));
    }
}
