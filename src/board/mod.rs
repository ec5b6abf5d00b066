//! Board representation and game-state types.
//!
//! Contains the core data structures for the map, armies and stacks, cities,
//! sites, players, quests and the overall `World`.

pub mod city;
pub mod map;
pub mod player;
pub mod position;
pub mod quest;
pub mod site;
pub mod state;
pub mod unit;

pub use city::{City, CityId, Production, CITY_CAPACITY, CITY_OFFSETS, CITY_SIZE};
pub use map::Map;
pub use player::{Diplomacy, Player, PlayerId};
pub use position::{Position, Terrain};
pub use quest::{Quest, QuestKind, QuestStatus};
pub use site::{Reward, Ruin, Temple};
pub use state::{World, NEUTRAL};
pub use unit::{Army, ArmyId, Item, Stack, StackId, MAX_STACK_SIZE};
