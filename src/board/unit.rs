//! Armies, items and stacks.
//!
//! An army is a single combatant. A stack is a group of up to
//! `MAX_STACK_SIZE` armies of one owner that share a tile, move together and
//! carry a pending path.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::position::Position;

/// Maximum number of armies in one stack (and on one tile).
pub const MAX_STACK_SIZE: usize = 8;

/// Stable identifier of a stack, unique within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StackId(pub u32);

/// Stable identifier of an army, unique within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArmyId(pub u32);

/// A carried item. Items add their bonus to the carrier's strength.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub strength_bonus: u32,
}

impl Item {
    pub fn new(name: &str, strength_bonus: u32) -> Self {
        Item {
            name: name.to_string(),
            strength_bonus,
        }
    }
}

/// A single combatant.
#[derive(Debug, Clone, PartialEq)]
pub struct Army {
    pub id: ArmyId,
    pub name: String,
    /// Base strength, 1..=9 for ordinary troops.
    pub strength: u32,
    pub hero: bool,
    pub moves: u32,
    pub max_moves: u32,
    /// Temples (by index) that have already blessed this army.
    pub blessings: Vec<u32>,
    pub items: Vec<Item>,
}

impl Army {
    pub fn new(id: ArmyId, name: &str, strength: u32, max_moves: u32) -> Self {
        Army {
            id,
            name: name.to_string(),
            strength,
            hero: false,
            moves: max_moves,
            max_moves,
            blessings: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn hero(id: ArmyId, name: &str, strength: u32, max_moves: u32) -> Self {
        Army {
            hero: true,
            ..Army::new(id, name, strength, max_moves)
        }
    }

    /// Strength including blessings and carried items.
    pub fn effective_strength(&self) -> u32 {
        self.strength
            + self.blessings.len() as u32
            + self.items.iter().map(|i| i.strength_bonus).sum::<u32>()
    }

    pub fn is_blessed_at(&self, temple: u32) -> bool {
        self.blessings.contains(&temple)
    }
}

/// A group of armies moving together.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    pub id: StackId,
    pub owner: PlayerId,
    pub pos: Position,
    pub armies: Vec<Army>,
    /// Pending steps, excluding the current position.
    pub path: Vec<Position>,
    pub parked: bool,
    pub defending: bool,
}

impl Stack {
    pub fn new(id: StackId, owner: PlayerId, pos: Position, armies: Vec<Army>) -> Self {
        assert!(
            armies.len() <= MAX_STACK_SIZE,
            "stack {} created with {} armies",
            id.0,
            armies.len()
        );
        Stack {
            id,
            owner,
            pos,
            armies,
            path: Vec::new(),
            parked: false,
            defending: false,
        }
    }

    pub fn size(&self) -> usize {
        self.armies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armies.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.armies.len() >= MAX_STACK_SIZE
    }

    /// Remaining movement points: the slowest member sets the pace.
    pub fn moves(&self) -> u32 {
        self.armies.iter().map(|a| a.moves).min().unwrap_or(0)
    }

    pub fn max_moves(&self) -> u32 {
        self.armies.iter().map(|a| a.max_moves).min().unwrap_or(0)
    }

    /// True when no member has spent any movement this turn.
    pub fn is_fully_rested(&self) -> bool {
        !self.armies.is_empty() && self.armies.iter().all(|a| a.moves >= a.max_moves)
    }

    pub fn has_hero(&self) -> bool {
        self.armies.iter().any(|a| a.hero)
    }

    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    /// Final waypoint of the pending path.
    pub fn destination(&self) -> Option<Position> {
        self.path.last().copied()
    }

    pub fn clear_path(&mut self) {
        self.path.clear();
    }

    /// Deducts `cost` movement points from every member.
    pub fn spend_moves(&mut self, cost: u32) {
        for army in &mut self.armies {
            army.moves = army.moves.saturating_sub(cost);
        }
    }

    pub fn reset_moves(&mut self) {
        for army in &mut self.armies {
            army.moves = army.max_moves;
        }
    }

    pub fn army_ids(&self) -> Vec<ArmyId> {
        self.armies.iter().map(|a| a.id).collect()
    }

    pub fn contains_army(&self, id: ArmyId) -> bool {
        self.armies.iter().any(|a| a.id == id)
    }

    pub fn heroes(&self) -> impl Iterator<Item = &Army> {
        self.armies.iter().filter(|a| a.hero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(strengths: &[u32]) -> Stack {
        let armies = strengths
            .iter()
            .enumerate()
            .map(|(i, &s)| Army::new(ArmyId(i as u32), "Infantry", s, 12))
            .collect();
        Stack::new(StackId(1), PlayerId(1), Position::new(0, 0), armies)
    }

    #[test]
    fn moves_follow_slowest_member() {
        let mut stack = stack_of(&[3, 4]);
        stack.armies[1].moves = 5;
        assert_eq!(stack.moves(), 5);
        assert!(!stack.is_fully_rested());
        stack.reset_moves();
        assert_eq!(stack.moves(), 12);
        assert!(stack.is_fully_rested());
    }

    #[test]
    fn empty_stack_has_no_moves() {
        let stack = stack_of(&[]);
        assert_eq!(stack.moves(), 0);
        assert!(!stack.is_fully_rested());
        assert!(stack.is_empty());
    }

    #[test]
    fn spend_moves_saturates() {
        let mut stack = stack_of(&[2]);
        stack.spend_moves(20);
        assert_eq!(stack.moves(), 0);
    }

    #[test]
    fn effective_strength_counts_items_and_blessings() {
        let mut army = Army::hero(ArmyId(9), "Hero", 5, 16);
        army.items.push(Item::new("Crown", 2));
        army.blessings.push(0);
        assert_eq!(army.effective_strength(), 8);
        assert!(army.is_blessed_at(0));
        assert!(!army.is_blessed_at(1));
    }

    #[test]
    fn destination_is_last_step() {
        let mut stack = stack_of(&[1]);
        assert_eq!(stack.destination(), None);
        stack.path = vec![Position::new(1, 0), Position::new(2, 0)];
        assert_eq!(stack.destination(), Some(Position::new(2, 0)));
        stack.clear_path();
        assert!(!stack.has_path());
    }

    #[test]
    #[should_panic]
    fn oversized_stack_panics() {
        stack_of(&[1; MAX_STACK_SIZE + 1]);
    }
}
