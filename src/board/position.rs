//! Map coordinates and terrain.
//!
//! The map is a rectangular grid of tiles. Movement is 8-way, so the natural
//! distance between two tiles is the Chebyshev distance.

use serde::{Deserialize, Serialize};

/// A tile coordinate on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Returns the Chebyshev distance to `other` (number of 8-way steps).
    pub fn distance(self, other: Position) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }

    /// Returns this position shifted by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Position {
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Returns the eight surrounding positions, without bounds checking.
    pub fn neighbours(self) -> [Position; 8] {
        [
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }
}

/// The terrain type of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Grass,
    Forest,
    Hills,
    Swamp,
    Mountains,
    Water,
}

impl Terrain {
    /// Movement points needed to enter a tile of this terrain.
    pub const fn move_cost(self) -> u32 {
        match self {
            Terrain::Grass => 2,
            Terrain::Forest => 4,
            Terrain::Hills => 4,
            Terrain::Swamp => 6,
            Terrain::Mountains => 8,
            Terrain::Water => 2,
        }
    }

    /// Returns the single-character scenario map symbol.
    pub const fn map_char(self) -> char {
        match self {
            Terrain::Grass => '.',
            Terrain::Forest => 'f',
            Terrain::Hills => 'h',
            Terrain::Swamp => 's',
            Terrain::Mountains => 'm',
            Terrain::Water => '~',
        }
    }

    /// Parses a terrain from its scenario map symbol.
    pub fn from_map_char(c: char) -> Option<Terrain> {
        match c {
            '.' => Some(Terrain::Grass),
            'f' => Some(Terrain::Forest),
            'h' => Some(Terrain::Hills),
            's' => Some(Terrain::Swamp),
            'm' => Some(Terrain::Mountains),
            '~' => Some(Terrain::Water),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_chebyshev() {
        let a = Position::new(2, 3);
        assert_eq!(a.distance(Position::new(2, 3)), 0);
        assert_eq!(a.distance(Position::new(5, 4)), 3);
        assert_eq!(a.distance(Position::new(-1, 9)), 6);
    }

    #[test]
    fn neighbours_are_one_step_away() {
        let p = Position::new(4, 4);
        for n in p.neighbours() {
            assert_eq!(p.distance(n), 1);
        }
    }

    #[test]
    fn terrain_map_chars() {
        for t in [
            Terrain::Grass,
            Terrain::Forest,
            Terrain::Hills,
            Terrain::Swamp,
            Terrain::Mountains,
            Terrain::Water,
        ] {
            assert_eq!(Terrain::from_map_char(t.map_char()), Some(t));
        }
        assert_eq!(Terrain::from_map_char('x'), None);
    }

    #[test]
    fn water_is_as_cheap_as_grass() {
        assert_eq!(Terrain::Water.move_cost(), Terrain::Grass.move_cost());
        assert!(Terrain::Mountains.move_cost() > Terrain::Hills.move_cost());
    }
}
