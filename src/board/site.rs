//! Ruins and temples.

use serde::{Deserialize, Serialize};

use super::position::Position;
use super::unit::Item;

/// What a successful ruin search yields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reward {
    Gold(u32),
    Item(Item),
}

/// A ruin that a hero can search once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruin {
    pub name: String,
    pub pos: Position,
    pub searched: bool,
    /// Strength of the guardian, if any.
    pub keeper: Option<u32>,
    pub reward: Reward,
}

/// A temple that blesses armies and hands out quests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Temple {
    pub name: String,
    pub pos: Position,
}
