//! Dijkstra path planning over terrain costs and path execution.
//!
//! Tiles held by hostile stacks or hostile cities can only be entered as the
//! last step of a path, which is where fights happen. Tiles held by players
//! at peace are never entered. Tiles of the mover's own side are passable
//! only while the mover could still join the stacks already there.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use crate::board::{PlayerId, Position, Stack, StackId, World, MAX_STACK_SIZE};

use super::combat::{self, FightResult};
use super::{MoveOutcome, Mover};

/// Who holds a tile, from one owner's point of view.
#[derive(Debug, Clone, Copy, Default)]
struct Occupancy {
    own_armies: usize,
    hostile: bool,
    foreign: bool,
}

/// Tile occupancy for `owner`, ignoring the moving stack itself.
fn occupancy(world: &World, owner: PlayerId, except: StackId) -> HashMap<Position, Occupancy> {
    let mut tiles: HashMap<Position, Occupancy> = HashMap::new();
    for stack in world.stacks.values().filter(|s| s.id != except) {
        let tile = tiles.entry(stack.pos).or_default();
        if stack.owner == owner {
            tile.own_armies += stack.size();
        } else if world.is_hostile(owner, stack.owner) {
            tile.hostile = true;
        } else {
            tile.foreign = true;
        }
    }
    for city in world.cities.iter().filter(|c| !c.burnt && c.owner != owner) {
        let hostile = world.is_hostile(owner, city.owner);
        for tile in city.tiles() {
            let entry = tiles.entry(tile).or_default();
            if hostile {
                entry.hostile = true;
            } else {
                entry.foreign = true;
            }
        }
    }
    tiles
}

fn enterable(tiles: &HashMap<Position, Occupancy>, pos: Position, size: usize, last_step: bool) -> bool {
    let Some(tile) = tiles.get(&pos) else {
        return true;
    };
    if tile.foreign {
        return false;
    }
    if tile.hostile {
        return last_step;
    }
    tile.own_armies + size <= MAX_STACK_SIZE
}

/// Finds the cheapest path for `stack` to `dest`.
///
/// Returns the steps (excluding the start tile) and their total cost.
pub fn find_path(world: &World, stack: &Stack, dest: Position) -> Option<(Vec<Position>, u32)> {
    if !world.map.contains(dest) {
        return None;
    }
    if stack.pos == dest {
        return Some((Vec::new(), 0));
    }
    let tiles = occupancy(world, stack.owner, stack.id);
    let size = stack.size();
    if !enterable(&tiles, dest, size, true) {
        return None;
    }

    let mut cost: HashMap<Position, u32> = HashMap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut frontier = BinaryHeap::new();
    cost.insert(stack.pos, 0);
    frontier.push(Reverse((0u32, stack.pos)));

    while let Some(Reverse((spent, pos))) = frontier.pop() {
        if pos == dest {
            break;
        }
        if spent > cost.get(&pos).copied().unwrap_or(u32::MAX) {
            continue;
        }
        for next in pos.neighbours() {
            let Some(terrain) = world.map.terrain(next) else {
                continue;
            };
            if !enterable(&tiles, next, size, next == dest) {
                continue;
            }
            let total = spent + terrain.move_cost();
            if total < cost.get(&next).copied().unwrap_or(u32::MAX) {
                cost.insert(next, total);
                came_from.insert(next, pos);
                frontier.push(Reverse((total, next)));
            }
        }
    }

    let total = *cost.get(&dest)?;
    let mut path = vec![dest];
    let mut cur = dest;
    while let Some(&prev) = came_from.get(&cur) {
        if prev == stack.pos {
            break;
        }
        path.push(prev);
        cur = prev;
    }
    path.reverse();
    Some((path, total))
}

/// Reference movement executor.
#[derive(Debug, Default)]
pub struct PathMover {
    steps_walked: u64,
}

impl PathMover {
    pub fn new() -> Self {
        PathMover::default()
    }

    /// Total steps walked by every stack this mover has executed.
    pub fn steps_walked(&self) -> u64 {
        self.steps_walked
    }
}

impl Mover for PathMover {
    fn estimate(&mut self, world: &mut World, stack: StackId, dest: Position) -> Option<u32> {
        let planned = world.stack(stack).and_then(|s| find_path(world, s, dest));
        let s = world.stack_mut(stack)?;
        match planned {
            Some((path, cost)) => {
                s.path = path;
                Some(cost)
            }
            None => {
                s.clear_path();
                None
            }
        }
    }

    fn execute(&mut self, world: &mut World, id: StackId) -> MoveOutcome {
        let mut outcome = MoveOutcome::stayed();

        loop {
            let Some(stack) = world.stack(id) else {
                break;
            };
            let Some(&next) = stack.path.first() else {
                break;
            };
            let owner = stack.owner;
            let last_step = stack.path.len() == 1;
            let Some(step_cost) = world.map.terrain(next).map(|t| t.move_cost()) else {
                outcome.aborted = true;
                break;
            };
            if step_cost > stack.moves() {
                break;
            }
            let tiles = occupancy(world, owner, id);
            if next.distance(stack.pos) != 1 || !enterable(&tiles, next, stack.size(), last_step) {
                debug!(stack = id.0, x = next.x, y = next.y, "path blocked");
                if let Some(s) = world.stack_mut(id) {
                    s.clear_path();
                }
                outcome.aborted = true;
                break;
            }

            if let Some(s) = world.stack_mut(id) {
                s.spend_moves(step_cost);
            }
            outcome.steps += 1;

            if last_step && !combat::defenders(world, owner, next).is_empty() {
                let result = combat::fight(world, id, next);
                outcome.fight = result;
                if result == Some(FightResult::DefenderWon) {
                    debug!(stack = id.0, x = next.x, y = next.y, "stack lost a fight");
                    outcome.died = true;
                    break;
                }
            }

            if let Some(s) = world.stack_mut(id) {
                s.pos = next;
                s.path.remove(0);
            }

            if last_step {
                let captured = world
                    .city_at(next)
                    .filter(|c| !c.burnt && c.owner != owner)
                    .map(|c| c.id);
                if let Some(city) = captured {
                    debug!(stack = id.0, city = city.0, "city captured");
                    world.capture_city(city, owner);
                }
                if world.armies_at(next, owner, Some(id)) > 0 {
                    world.merge_tile(next, owner);
                }
            }
        }

        outcome.moved = outcome.steps > 0;
        self.steps_walked += outcome.steps as u64;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Map, Terrain, NEUTRAL};

    fn world() -> (World, PlayerId) {
        let mut w = World::new(Map::filled(12, 12, Terrain::Grass));
        let me = w.add_player("Sirians", 0);
        (w, me)
    }

    #[test]
    fn straight_path_on_grass() {
        let (mut w, me) = world();
        let a = w.new_army("Scouts", 2, 20);
        let s = w.add_stack(me, Position::new(0, 0), vec![a]);
        let (path, cost) = find_path(&w, w.stack(s).unwrap(), Position::new(3, 3)).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(cost, 6);
        assert_eq!(path.last(), Some(&Position::new(3, 3)));
    }

    #[test]
    fn path_avoids_mountains() {
        let (mut w, me) = world();
        w.map.set_terrain(Position::new(2, 0), Terrain::Mountains);
        w.map.set_terrain(Position::new(2, 1), Terrain::Mountains);
        let a = w.new_army("Scouts", 2, 40);
        let s = w.add_stack(me, Position::new(0, 0), vec![a]);
        let (path, cost) = find_path(&w, w.stack(s).unwrap(), Position::new(4, 0)).unwrap();
        assert_eq!(cost, 8);
        assert!(path.iter().all(|p| w.map.terrain(*p) != Some(Terrain::Mountains)));
    }

    #[test]
    fn hostile_tile_only_as_last_step() {
        let (mut w, me) = world();
        let orc = w.new_army("Orcs", 1, 10);
        w.add_stack(NEUTRAL, Position::new(1, 0), vec![orc]);
        let a = w.new_army("Knights", 5, 20);
        let s = w.add_stack(me, Position::new(0, 0), vec![a]);
        let (path, _) = find_path(&w, w.stack(s).unwrap(), Position::new(2, 0)).unwrap();
        assert!(!path.contains(&Position::new(1, 0)));
        let (path, _) = find_path(&w, w.stack(s).unwrap(), Position::new(1, 0)).unwrap();
        assert_eq!(path, vec![Position::new(1, 0)]);
    }

    #[test]
    fn execute_respects_move_budget() {
        let (mut w, me) = world();
        let a = w.new_army("Infantry", 3, 5);
        let s = w.add_stack(me, Position::new(0, 0), vec![a]);
        let mut mover = PathMover::new();
        assert_eq!(mover.estimate(&mut w, s, Position::new(5, 0)), Some(10));
        let outcome = mover.execute(&mut w, s);
        assert!(outcome.moved);
        assert_eq!(outcome.steps, 2);
        let stack = w.stack(s).unwrap();
        assert_eq!(stack.pos.x, 2);
        assert_eq!(stack.moves(), 1);
        assert_eq!(stack.path.len(), 3);
    }

    #[test]
    fn walking_into_empty_city_captures_it() {
        let (mut w, me) = world();
        let city = w.add_city("Kor", Position::new(3, 0), NEUTRAL);
        let a = w.new_army("Infantry", 3, 20);
        let s = w.add_stack(me, Position::new(0, 0), vec![a]);
        let mut mover = PathMover::new();
        assert!(mover.estimate(&mut w, s, Position::new(3, 0)).is_some());
        let outcome = mover.execute(&mut w, s);
        assert!(!outcome.died);
        assert_eq!(outcome.fight, None);
        assert_eq!(w.city(city).unwrap().owner, me);
    }

    #[test]
    fn arriving_joins_own_stack() {
        let (mut w, me) = world();
        let a = w.new_army("Infantry", 3, 20);
        let b = w.new_army("Infantry", 3, 20);
        let home = w.add_stack(me, Position::new(2, 2), vec![a]);
        let s = w.add_stack(me, Position::new(0, 0), vec![b]);
        let mut mover = PathMover::new();
        mover.estimate(&mut w, s, Position::new(2, 2));
        mover.execute(&mut w, s);
        assert!(w.stack(s).is_none());
        assert_eq!(w.stack(home).unwrap().size(), 2);
    }

    #[test]
    fn losing_attacker_dies() {
        let (mut w, me) = world();
        let big = w.new_army("Dragon", 9, 10);
        w.add_stack(NEUTRAL, Position::new(1, 1), vec![big]);
        let a = w.new_army("Scouts", 1, 20);
        let s = w.add_stack(me, Position::new(0, 0), vec![a]);
        let mut mover = PathMover::new();
        mover.estimate(&mut w, s, Position::new(1, 1));
        let outcome = mover.execute(&mut w, s);
        assert!(outcome.died);
        assert_eq!(outcome.fight, Some(FightResult::DefenderWon));
        assert!(w.stack(s).is_none());
    }

    #[test]
    fn full_own_tile_is_unreachable() {
        let (mut w, me) = world();
        let garrison: Vec<_> = (0..MAX_STACK_SIZE).map(|_| w.new_army("Guard", 2, 10)).collect();
        w.add_stack(me, Position::new(4, 4), garrison);
        let a = w.new_army("Scouts", 1, 20);
        let s = w.add_stack(me, Position::new(0, 0), vec![a]);
        let mut mover = PathMover::new();
        assert_eq!(mover.estimate(&mut w, s, Position::new(4, 4)), None);
    }
}
