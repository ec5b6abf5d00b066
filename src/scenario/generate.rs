//! Random world generation for self-play and benchmarks.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::board::{
    Item, Map, PlayerId, Position, Production, Reward, Ruin, Temple, Terrain, World, CITY_OFFSETS,
    NEUTRAL,
};

const PLAYER_NAMES: [&str; 8] = [
    "Sirians",
    "Storm Giants",
    "Grey Dwarves",
    "Orcs of Kor",
    "Elvallie",
    "Horse Lords",
    "Selentines",
    "Lord Bane",
];

/// Cities never start closer than this to one another.
const CITY_SPACING: u32 = 5;
const PLACEMENT_TRIES: usize = 400;

/// Generates a playable world for `players` factions (clamped to 1..=8).
///
/// Every faction gets a home city with a hero and an army stack. Neutral
/// cities, ruins and temples fill the rest of the map. The same seed always
/// gives the same world.
pub fn generate(seed: u64, players: usize, width: i32, height: i32) -> World {
    let players = players.clamp(1, PLAYER_NAMES.len());
    let width = width.max(12);
    let height = height.max(12);
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut map = Map::filled(width, height, Terrain::Grass);
    scatter_terrain(&mut map, &mut rng);
    let mut world = World::new(map);

    let mut taken: Vec<Position> = Vec::new();
    for name in PLAYER_NAMES.iter().take(players) {
        let player = world.add_player(name, 100);
        let Some(home) = place(&mut world, &mut rng, &taken) else {
            break;
        };
        taken.push(home);
        let city = world.add_city(&format!("{name} Keep"), home, player);
        if let Some(c) = world.city_mut(city) {
            c.production = Some(Production {
                strength: 3,
                max_moves: 12,
                turns: 2,
            });
        }
        spawn_garrison(&mut world, &mut rng, player, home);
    }

    let neutrals = ((width * height) / 150).max(players as i32 * 2);
    for i in 0..neutrals {
        let Some(pos) = place(&mut world, &mut rng, &taken) else {
            break;
        };
        taken.push(pos);
        world.add_city(&format!("Freehold {}", i + 1), pos, NEUTRAL);
        let guards = (0..rng.gen_range(1..=3))
            .map(|_| {
                let strength = rng.gen_range(1..=4);
                world.new_army("Militia", strength, 8)
            })
            .collect();
        world.add_stack(NEUTRAL, pos, guards);
    }

    for i in 0..(players + 1) {
        if let Some(pos) = free_land(&world, &mut rng) {
            let reward = if rng.gen_bool(0.5) {
                Reward::Gold(rng.gen_range(20..=120))
            } else {
                Reward::Item(Item::new("Runed Blade", rng.gen_range(1..=3)))
            };
            let keeper = rng.gen_bool(0.7).then(|| rng.gen_range(2..=7));
            world.ruins.push(Ruin {
                name: format!("Ruin {}", i + 1),
                pos,
                searched: false,
                keeper,
                reward,
            });
        }
        if let Some(pos) = free_land(&world, &mut rng) {
            world.temples.push(Temple {
                name: format!("Temple {}", i + 1),
                pos,
            });
        }
    }

    world
}

/// Paints a few blobs of rough terrain and a lake or two.
fn scatter_terrain(map: &mut Map, rng: &mut SmallRng) {
    let blobs = (map.width() * map.height()) / 60;
    for _ in 0..blobs {
        let terrain = match rng.gen_range(0..10) {
            0..=3 => Terrain::Forest,
            4..=5 => Terrain::Hills,
            6 => Terrain::Swamp,
            7 => Terrain::Mountains,
            _ => Terrain::Water,
        };
        let centre = Position::new(rng.gen_range(0..map.width()), rng.gen_range(0..map.height()));
        let radius = rng.gen_range(1..=2);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let pos = centre.offset(dx, dy);
                if map.contains(pos) && rng.gen_bool(0.75) {
                    map.set_terrain(pos, terrain);
                }
            }
        }
    }
}

/// Picks a city origin spaced away from `taken` and clears its footprint to
/// grass.
fn place(world: &mut World, rng: &mut SmallRng, taken: &[Position]) -> Option<Position> {
    let (w, h) = (world.map.width(), world.map.height());
    for _ in 0..PLACEMENT_TRIES {
        let pos = Position::new(rng.gen_range(1..w - 2), rng.gen_range(1..h - 2));
        if taken.iter().all(|t| t.distance(pos) >= CITY_SPACING) {
            for (dx, dy) in CITY_OFFSETS {
                world.map.set_terrain(pos.offset(dx, dy), Terrain::Grass);
            }
            return Some(pos);
        }
    }
    None
}

fn spawn_garrison(world: &mut World, rng: &mut SmallRng, player: PlayerId, home: Position) {
    let hero = world.new_hero("Hero", rng.gen_range(4..=6), 14);
    let escort = world.new_army("Light Infantry", 3, 12);
    world.add_stack(player, home, vec![hero, escort]);
    let troops = (0..3)
        .map(|_| {
            let strength = rng.gen_range(2..=5);
            world.new_army("Infantry", strength, 12)
        })
        .collect();
    world.add_stack(player, home.offset(1, 1), troops);
}

/// An empty land tile outside every city.
fn free_land(world: &World, rng: &mut SmallRng) -> Option<Position> {
    let (w, h) = (world.map.width(), world.map.height());
    for _ in 0..PLACEMENT_TRIES {
        let pos = Position::new(rng.gen_range(0..w), rng.gen_range(0..h));
        if !world.map.is_water(pos)
            && world.city_at(pos).is_none()
            && world.stacks_at(pos).is_empty()
            && !world.ruins.iter().any(|r| r.pos == pos)
            && !world.temples.iter().any(|t| t.pos == pos)
        {
            return Some(pos);
        }
    }
    None
}
