//! Scenario files and generated worlds.
//!
//! A scenario is a JSON document describing a starting position. Players are
//! numbered from 1 in the order they are listed; owner 0 is the neutral
//! player. Map rows use one character per tile:
//!
//! | char | terrain   |
//! |------|-----------|
//! | `.`  | grass     |
//! | `f`  | forest    |
//! | `h`  | hills     |
//! | `s`  | swamp     |
//! | `m`  | mountains |
//! | `~`  | water     |

mod generate;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{
    Diplomacy, Item, Map, PlayerId, Position, Production, Reward, Ruin, Temple, Terrain, World,
    MAX_STACK_SIZE,
};

pub use generate::generate;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("map has no rows")]
    EmptyMap,

    #[error("map row {row} has {found} tiles, expected {expected}")]
    RaggedMap {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("unknown terrain '{ch}' at row {row}, column {col}")]
    UnknownTerrain { row: usize, col: usize, ch: char },

    #[error("{what} refers to unknown owner {owner}")]
    UnknownOwner { what: String, owner: u8 },

    #[error("{what} at ({x}, {y}) lies off the map")]
    OffMap { what: String, x: i32, y: i32 },

    #[error("{what} overlaps city {city}")]
    Overlap { what: String, city: String },

    #[error("stack {index} has {size} armies, at most {max} allowed")]
    StackTooLarge { index: usize, size: usize, max: usize },

    #[error("tile ({x}, {y}) holds more armies or owners than a tile can")]
    Crowded { x: i32, y: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDef {
    pub name: String,
    #[serde(default)]
    pub gold: u32,
}

fn default_income() -> u32 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityDef {
    pub name: String,
    /// Origin (top-left) tile of the 2x2 footprint.
    pub at: (i32, i32),
    #[serde(default)]
    pub owner: u8,
    #[serde(default = "default_income")]
    pub income: u32,
    #[serde(default)]
    pub production: Option<Production>,
    #[serde(default)]
    pub burnt: bool,
}

fn default_moves() -> u32 {
    12
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmyDef {
    pub name: String,
    pub strength: u32,
    #[serde(default = "default_moves")]
    pub moves: u32,
    #[serde(default)]
    pub hero: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackDef {
    pub owner: u8,
    pub at: (i32, i32),
    pub armies: Vec<ArmyDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuinDef {
    pub name: String,
    pub at: (i32, i32),
    #[serde(default)]
    pub keeper: Option<u32>,
    pub reward: Reward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempleDef {
    pub name: String,
    pub at: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootDef {
    pub at: (i32, i32),
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Players start at peace and must declare war.
    pub diplomacy: bool,
    pub quests: bool,
    pub turn: u32,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            diplomacy: false,
            quests: true,
            turn: 1,
        }
    }
}

/// A starting position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub map: Vec<String>,
    pub players: Vec<PlayerDef>,
    #[serde(default)]
    pub cities: Vec<CityDef>,
    #[serde(default)]
    pub stacks: Vec<StackDef>,
    #[serde(default)]
    pub ruins: Vec<RuinDef>,
    #[serde(default)]
    pub temples: Vec<TempleDef>,
    #[serde(default)]
    pub loot: Vec<LootDef>,
    #[serde(default)]
    pub options: Options,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Scenario, ScenarioError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Scenario::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Scenario, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    fn parse_map(&self) -> Result<Map, ScenarioError> {
        let expected = self.map.first().ok_or(ScenarioError::EmptyMap)?.chars().count();
        let mut rows = Vec::with_capacity(self.map.len());
        for (row, line) in self.map.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(ScenarioError::RaggedMap { row, found, expected });
            }
            let tiles = line
                .chars()
                .enumerate()
                .map(|(col, ch)| Terrain::from_map_char(ch).ok_or(ScenarioError::UnknownTerrain { row, col, ch }))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(tiles);
        }
        Map::from_rows(rows).ok_or(ScenarioError::EmptyMap)
    }

    /// Builds the world, checking every reference and placement.
    pub fn into_world(self) -> Result<World, ScenarioError> {
        let map = self.parse_map()?;
        let mut world = World::new(map);
        world.diplomacy = Diplomacy::new(self.options.diplomacy);
        world.quests_enabled = self.options.quests;
        world.turn = self.options.turn.max(1);

        for player in &self.players {
            world.add_player(&player.name, player.gold);
        }
        let resolve_owner = |what: String, id: u8, world: &World| -> Result<PlayerId, ScenarioError> {
            let id = PlayerId(id);
            match world.player(id) {
                Some(_) => Ok(id),
                None => Err(ScenarioError::UnknownOwner { what, owner: id.0 }),
            }
        };
        let on_map = |what: &str, (x, y): (i32, i32), world: &World| -> Result<Position, ScenarioError> {
            let pos = Position::new(x, y);
            if world.map.contains(pos) {
                Ok(pos)
            } else {
                Err(ScenarioError::OffMap {
                    what: what.to_string(),
                    x,
                    y,
                })
            }
        };

        for def in self.cities {
            let what = format!("city {}", def.name);
            let owner = resolve_owner(what.clone(), def.owner, &world)?;
            let pos = on_map(&what, def.at, &world)?;
            on_map(&what, (def.at.0 + 1, def.at.1 + 1), &world)?;
            let corners = [pos, pos.offset(1, 0), pos.offset(0, 1), pos.offset(1, 1)];
            if let Some(other) = world.cities.iter().find(|c| corners.iter().any(|t| c.contains(*t))) {
                return Err(ScenarioError::Overlap {
                    what,
                    city: other.name.clone(),
                });
            }
            let id = world.add_city(&def.name, pos, owner);
            if let Some(city) = world.city_mut(id) {
                city.income = def.income;
                city.production = def.production;
                city.burnt = def.burnt;
            }
        }

        let mut occupants: HashMap<Position, (PlayerId, usize)> = HashMap::new();
        for (index, def) in self.stacks.into_iter().enumerate() {
            let what = format!("stack {index}");
            let owner = resolve_owner(what.clone(), def.owner, &world)?;
            let pos = on_map(&what, def.at, &world)?;
            let size = def.armies.len();
            if size == 0 || size > MAX_STACK_SIZE {
                return Err(ScenarioError::StackTooLarge {
                    index,
                    size,
                    max: MAX_STACK_SIZE,
                });
            }
            let entry = occupants.entry(pos).or_insert((owner, 0));
            entry.1 += size;
            if entry.0 != owner || entry.1 > MAX_STACK_SIZE {
                return Err(ScenarioError::Crowded { x: pos.x, y: pos.y });
            }
            let armies = def
                .armies
                .iter()
                .map(|a| {
                    if a.hero {
                        world.new_hero(&a.name, a.strength, a.moves)
                    } else {
                        world.new_army(&a.name, a.strength, a.moves)
                    }
                })
                .collect();
            world.add_stack(owner, pos, armies);
        }

        for def in self.ruins {
            let pos = on_map(&format!("ruin {}", def.name), def.at, &world)?;
            world.ruins.push(Ruin {
                name: def.name,
                pos,
                searched: false,
                keeper: def.keeper,
                reward: def.reward,
            });
        }
        for def in self.temples {
            let pos = on_map(&format!("temple {}", def.name), def.at, &world)?;
            world.temples.push(Temple { name: def.name, pos });
        }
        for def in self.loot {
            let pos = on_map("loot", def.at, &world)?;
            world.map.drop_item(pos, def.item);
        }

        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::NEUTRAL;

    const SKIRMISH: &str = r#"{
        "name": "skirmish",
        "map": [
            "..........",
            "..ff......",
            "......~~..",
            "..........",
            "....mm...."
        ],
        "players": [{"name": "Sirians", "gold": 50}, {"name": "Lord Bane", "gold": 50}],
        "cities": [
            {"name": "Marthos", "at": [0, 0], "owner": 1},
            {"name": "Kor", "at": [8, 3], "owner": 2, "production": {"strength": 4, "max_moves": 10, "turns": 2}},
            {"name": "Dunethal", "at": [4, 2]}
        ],
        "stacks": [
            {"owner": 1, "at": [0, 0], "armies": [{"name": "Hero", "strength": 5, "hero": true}, {"name": "Infantry", "strength": 3}]},
            {"owner": 2, "at": [8, 3], "armies": [{"name": "Cavalry", "strength": 4, "moves": 16}]}
        ],
        "ruins": [{"name": "Gorag", "at": [2, 4], "keeper": 4, "reward": {"Gold": 80}}],
        "temples": [{"name": "Sulkh", "at": [6, 0]}],
        "loot": [{"at": [3, 3], "item": {"name": "Horn", "strength_bonus": 2}}],
        "options": {"diplomacy": true}
    }"#;

    #[test]
    fn skirmish_builds() {
        let world = Scenario::from_json(SKIRMISH).unwrap().into_world().unwrap();
        assert_eq!(world.map.width(), 10);
        assert_eq!(world.map.height(), 5);
        assert_eq!(world.map.terrain(Position::new(6, 2)), Some(Terrain::Water));
        assert_eq!(world.players.len(), 3);
        assert_eq!(world.cities.len(), 3);
        assert_eq!(world.cities[2].owner, NEUTRAL);
        assert_eq!(world.cities[1].production.map(|p| p.strength), Some(4));
        assert_eq!(world.stacks.len(), 2);
        assert!(world.stacks_of(PlayerId(1)).any(|s| s.has_hero()));
        assert_eq!(world.ruins[0].keeper, Some(4));
        assert_eq!(world.temples[0].pos, Position::new(6, 0));
        assert_eq!(world.map.loot.get(&Position::new(3, 3)).map(|v| v.len()), Some(1));
        assert!(world.diplomacy.enabled);
        assert!(world.quests_enabled);
    }

    #[test]
    fn ragged_map_is_rejected() {
        let mut scenario = Scenario::from_json(SKIRMISH).unwrap();
        scenario.map[2].push('.');
        let err = scenario.into_world().unwrap_err();
        assert!(matches!(err, ScenarioError::RaggedMap { row: 2, found: 11, expected: 10 }));
    }

    #[test]
    fn unknown_terrain_is_rejected() {
        let mut scenario = Scenario::from_json(SKIRMISH).unwrap();
        scenario.map[0] = "....X.....".to_string();
        let err = scenario.into_world().unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownTerrain { row: 0, col: 4, ch: 'X' }));
    }

    #[test]
    fn unknown_owner_is_rejected() {
        let mut scenario = Scenario::from_json(SKIRMISH).unwrap();
        scenario.stacks[1].owner = 7;
        let err = scenario.into_world().unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownOwner { owner: 7, .. }));
    }

    #[test]
    fn city_footprint_must_fit() {
        let mut scenario = Scenario::from_json(SKIRMISH).unwrap();
        scenario.cities[1].at = (9, 3);
        let err = scenario.into_world().unwrap_err();
        assert!(matches!(err, ScenarioError::OffMap { x: 10, y: 4, .. }));
    }

    #[test]
    fn overlapping_cities_are_rejected() {
        let mut scenario = Scenario::from_json(SKIRMISH).unwrap();
        scenario.cities[2].at = (1, 1);
        let err = scenario.into_world().unwrap_err();
        assert!(matches!(err, ScenarioError::Overlap { .. }));
    }

    #[test]
    fn mixed_owners_on_a_tile_are_rejected() {
        let mut scenario = Scenario::from_json(SKIRMISH).unwrap();
        scenario.stacks[1].at = (0, 0);
        let err = scenario.into_world().unwrap_err();
        assert!(matches!(err, ScenarioError::Crowded { x: 0, y: 0 }));
    }

    #[test]
    fn bad_json_is_parse_error() {
        assert!(matches!(
            Scenario::from_json("{\"map\": 3}"),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skirmish.json");
        std::fs::write(&path, SKIRMISH).unwrap();
        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.name, "skirmish");
        assert!(matches!(
            Scenario::load(dir.path().join("missing.json")),
            Err(ScenarioError::Io { .. })
        ));
    }
}
