//! Terrain grid and loot bags.

use std::collections::BTreeMap;

use super::position::{Position, Terrain};
use super::unit::Item;

/// The game map: a `width * height` grid of terrain plus items lying on tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    width: i32,
    height: i32,
    tiles: Vec<Terrain>,
    /// Dropped or placed items, keyed by tile.
    pub loot: BTreeMap<Position, Vec<Item>>,
}

impl Map {
    /// Creates a map filled with a single terrain type.
    pub fn filled(width: i32, height: i32, terrain: Terrain) -> Self {
        assert!(width > 0 && height > 0, "map dimensions must be positive");
        Map {
            width,
            height,
            tiles: vec![terrain; (width * height) as usize],
            loot: BTreeMap::new(),
        }
    }

    /// Builds a map from rows of terrain. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<Terrain>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Map {
            width: width as i32,
            height: height as i32,
            tiles: rows.into_iter().flatten().collect(),
            loot: BTreeMap::new(),
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    #[inline]
    fn index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    /// Returns the terrain at `pos`, or `None` outside the map.
    pub fn terrain(&self, pos: Position) -> Option<Terrain> {
        if self.contains(pos) {
            Some(self.tiles[self.index(pos)])
        } else {
            None
        }
    }

    pub fn set_terrain(&mut self, pos: Position, terrain: Terrain) {
        if self.contains(pos) {
            let idx = self.index(pos);
            self.tiles[idx] = terrain;
        }
    }

    pub fn is_water(&self, pos: Position) -> bool {
        self.terrain(pos) == Some(Terrain::Water)
    }

    /// Places an item on a tile.
    pub fn drop_item(&mut self, pos: Position, item: Item) {
        self.loot.entry(pos).or_default().push(item);
    }

    /// Removes and returns every item lying on `pos`.
    pub fn take_items(&mut self, pos: Position) -> Vec<Item> {
        self.loot.remove(&pos).unwrap_or_default()
    }

    /// Renders the terrain as scenario rows.
    pub fn to_rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|t| t.map_char()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_map_bounds() {
        let map = Map::filled(4, 3, Terrain::Grass);
        assert!(map.contains(Position::new(3, 2)));
        assert!(!map.contains(Position::new(4, 2)));
        assert!(!map.contains(Position::new(0, -1)));
        assert_eq!(map.terrain(Position::new(1, 1)), Some(Terrain::Grass));
        assert_eq!(map.terrain(Position::new(9, 9)), None);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let rows = vec![
            vec![Terrain::Grass, Terrain::Water],
            vec![Terrain::Grass],
        ];
        assert!(Map::from_rows(rows).is_none());
        assert!(Map::from_rows(Vec::new()).is_none());
    }

    #[test]
    fn rows_roundtrip_through_text() {
        let rows = vec![
            vec![Terrain::Grass, Terrain::Water, Terrain::Forest],
            vec![Terrain::Hills, Terrain::Swamp, Terrain::Mountains],
        ];
        let map = Map::from_rows(rows).unwrap();
        assert_eq!(map.to_rows(), vec![".~f".to_string(), "hsm".to_string()]);
        assert!(map.is_water(Position::new(1, 0)));
    }

    #[test]
    fn loot_is_taken_once() {
        let mut map = Map::filled(3, 3, Terrain::Grass);
        let pos = Position::new(1, 1);
        map.drop_item(pos, Item::new("Sword", 2));
        map.drop_item(pos, Item::new("Shield", 1));
        assert_eq!(map.take_items(pos).len(), 2);
        assert!(map.take_items(pos).is_empty());
    }
}
