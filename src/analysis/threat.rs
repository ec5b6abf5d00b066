//! Threats: scored hostile strongpoints and field stacks.
//!
//! A threat is computed for one faction at the start of its turn. Its
//! `danger` is frozen at that moment; its live `strength` and approach point
//! are re-derived from the world on every query, so a city captured earlier
//! in the same turn reads as neutralized.

use crate::board::{CityId, PlayerId, Position, StackId, World};

use super::Analysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatKind {
    /// A city the faction does not own.
    City(CityId),
    /// A hostile stack in the field.
    Stack(StackId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Threat {
    pub kind: ThreatKind,
    /// The faction this threat was assessed for.
    pub faction: PlayerId,
    /// Owner of the threatening city or stack.
    pub owner: PlayerId,
    pub danger: f32,
}

impl Threat {
    pub fn is_city(&self) -> bool {
        matches!(self.kind, ThreatKind::City(_))
    }

    pub fn city(&self) -> Option<CityId> {
        match self.kind {
            ThreatKind::City(id) => Some(id),
            ThreatKind::Stack(_) => None,
        }
    }

    /// Danger as assessed at the start of the turn.
    pub fn danger(&self) -> f32 {
        self.danger
    }

    /// True once the threat no longer exists: its city was taken by the
    /// faction or burnt, or its stack is gone.
    pub fn is_eliminated(&self, world: &World) -> bool {
        match self.kind {
            ThreatKind::City(id) => world
                .city(id)
                .map_or(true, |c| c.burnt || c.owner == self.faction),
            ThreatKind::Stack(id) => world
                .stack(id)
                .map_or(true, |s| s.owner == self.faction),
        }
    }

    /// Live strength of whatever still stands at the threat.
    pub fn strength(&self, world: &World, analysis: &dyn Analysis) -> f32 {
        if self.is_eliminated(world) {
            return 0.0;
        }
        match self.kind {
            ThreatKind::City(id) => world
                .stacks_in_city(id, None)
                .iter()
                .filter_map(|s| world.stack(*s))
                .filter(|s| s.owner != self.faction)
                .map(|s| analysis.stack_strength(s))
                .sum(),
            ThreatKind::Stack(id) => world
                .stack(id)
                .map_or(0.0, |s| analysis.stack_strength(s)),
        }
    }

    /// The tile to head for when approaching from `from`, or `None` once the
    /// threat is eliminated.
    pub fn closest_point(&self, world: &World, from: Position) -> Option<Position> {
        if self.is_eliminated(world) {
            return None;
        }
        match self.kind {
            ThreatKind::City(id) => world.city(id).map(|c| c.closest_tile(from)),
            ThreatKind::Stack(id) => world.stack(id).map(|s| s.pos),
        }
    }
}
