//! Cities.
//!
//! A city covers a 2x2 block of tiles anchored at its origin (top-left)
//! tile. Each tile can hold up to `MAX_STACK_SIZE` armies of the owner.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::position::Position;
use super::unit::MAX_STACK_SIZE;

/// Side length of a city footprint.
pub const CITY_SIZE: i32 = 2;

/// Offsets of the footprint tiles relative to the origin, in probe order.
pub const CITY_OFFSETS: [(i32, i32); 4] = [(0, 0), (0, 1), (1, 0), (1, 1)];

/// Maximum number of armies a city can hold.
pub const CITY_CAPACITY: usize = CITY_OFFSETS.len() * MAX_STACK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CityId(pub u32);

/// What a city builds and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub strength: u32,
    pub max_moves: u32,
    pub turns: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub pos: Position,
    pub owner: PlayerId,
    pub burnt: bool,
    pub income: u32,
    pub production: Option<Production>,
    /// Turns spent on the current production item.
    pub progress: u32,
}

impl City {
    pub fn new(id: CityId, name: &str, pos: Position, owner: PlayerId) -> Self {
        City {
            id,
            name: name.to_string(),
            pos,
            owner,
            burnt: false,
            income: 20,
            production: None,
            progress: 0,
        }
    }

    /// True when `pos` lies inside the city footprint.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.pos.x
            && pos.y >= self.pos.y
            && pos.x < self.pos.x + CITY_SIZE
            && pos.y < self.pos.y + CITY_SIZE
    }

    /// Footprint tiles in probe order.
    pub fn tiles(&self) -> [Position; 4] {
        CITY_OFFSETS.map(|(dx, dy)| self.pos.offset(dx, dy))
    }

    /// The footprint tile nearest to `from`; the first in probe order on ties.
    pub fn closest_tile(&self, from: Position) -> Position {
        let mut best = self.pos;
        let mut best_dist = u32::MAX;
        for tile in self.tiles() {
            let d = tile.distance(from);
            if d < best_dist {
                best = tile;
                best_dist = d;
            }
        }
        best
    }

    /// Distance from `from` to the nearest footprint tile.
    pub fn distance(&self, from: Position) -> u32 {
        self.closest_tile(from).distance(from)
    }
}
