//! Opportunistic destinations: quests, temples, ruins and loot.
//!
//! The allocation engine runs these before any military phase. Each call
//! looks for a worthwhile site near one stack, walks toward it through the
//! given `Mover` and applies the effect on arrival.

pub mod visitor;

use serde::Deserialize;

use crate::board::{StackId, World};
use crate::movement::Mover;

pub use visitor::SiteVisitor;

/// Result of one opportunistic visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visit {
    /// The stack took at least one step.
    pub moved: bool,
    /// The stack was destroyed on the way or at the site.
    pub died: bool,
    /// The site's effect was applied: quest advanced or taken, blessing
    /// received, ruin searched, items picked up.
    pub done: bool,
}

/// Tuning for `SiteVisitor`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Temples farther away than this are ignored.
    pub temple_radius: u32,
    pub ruin_radius: u32,
    pub loot_radius: u32,
    /// Turns a new quest stays open.
    pub quest_turns: u32,
    /// A temple is only worth a detour when at least this share of the
    /// stack has not been blessed there yet.
    pub blessing_min_fraction: f32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            temple_radius: 8,
            ruin_radius: 10,
            loot_radius: 6,
            quest_turns: 20,
            blessing_min_fraction: 0.5,
        }
    }
}

/// The opportunistic collaborator.
pub trait Opportunities {
    /// Walks a questing hero's stack toward the quest's live target.
    fn continue_quest(&mut self, world: &mut World, mover: &mut dyn Mover, stack: StackId) -> Visit;

    /// Walks a hero's stack to a temple to pick up a quest.
    fn visit_temple_for_quest(&mut self, world: &mut World, mover: &mut dyn Mover, stack: StackId) -> Visit;

    /// Walks a stack to a temple that would bless it.
    fn visit_temple_for_blessing(&mut self, world: &mut World, mover: &mut dyn Mover, stack: StackId) -> Visit;

    /// Walks a hero's stack to the nearest unsearched ruin and searches it.
    fn visit_ruin(&mut self, world: &mut World, mover: &mut dyn Mover, stack: StackId) -> Visit;

    /// Walks a hero's stack to nearby loot and picks it up.
    fn pickup_items(&mut self, world: &mut World, mover: &mut dyn Mover, stack: StackId) -> Visit;
}
