//! Catch-all movement: default orders, in-city shuffling and thinning out
//! crowded cities.

use rand::Rng;
use tracing::{debug, info};

use crate::board::{CityId, StackId, CITY_CAPACITY, CITY_OFFSETS, MAX_STACK_SIZE};

use super::allocation::Allocator;

impl Allocator<'_> {
    /// Gives every stack still in the working set something to do.
    ///
    /// Stacks in one of the faction's cities that still needs reinforcing
    /// stay and are shuffled into full stacks. Everything else heads for the
    /// nearest city of another player, declaring war on a merely foreign
    /// owner only when a path there exists.
    pub fn default_stack_movements(&mut self) -> usize {
        let analysis = self.analysis;
        let mut moved = 0;

        for id in self.stacks.ids() {
            if self.cancelled() {
                break;
            }
            if !self.available(id) {
                continue;
            }
            let Some(pos) = self.world.stack(id).map(|s| s.pos) else {
                continue;
            };

            let home = self
                .world
                .city_at(pos)
                .filter(|c| c.owner == self.player)
                .map(|c| c.id);
            let needed = home.map_or(false, |c| analysis.reinforcements_needed(self.world, c) > 0.0);
            if needed {
                if self.shuffle_stacks_within_city(id) {
                    moved += 1;
                }
                self.stacks.remove(id);
                continue;
            }

            let player = self.player;
            let target = self.world.nearest_city(pos, |c| {
                !c.burnt
                    && c.owner != player
                    && (self.world.is_hostile(player, c.owner) || self.world.is_foreign(player, c.owner))
            });
            let Some(city) = target else {
                continue;
            };
            let Some((owner, dest)) = self.world.city(city).map(|c| (c.owner, c.closest_tile(pos))) else {
                continue;
            };
            // Paths only enter hostile tiles, so plan as if already at war
            // and withdraw the declaration when no path exists.
            let new_war = self.world.is_foreign(player, owner) && self.world.declare_war(player, owner);
            let reachable = matches!(self.mover.estimate(self.world, id, dest), Some(cost) if cost > 0);
            if !reachable {
                if new_war {
                    self.world.diplomacy.make_peace(player, owner);
                }
                debug!(stack = id.0, city = city.0, "default target unreachable");
                continue;
            }
            if new_war {
                self.stats.wars_declared += 1;
                info!(player = player.0, enemy = owner.0, "war declared");
            }
            let outcome = self.continue_path(id);
            moved += self.settle_move(id, outcome);
        }
        moved
    }

    /// Tidies a stack inside its city so partial stacks end up joined.
    ///
    /// A stack on the city's origin tile merges with whatever else of the
    /// faction stands there, and reports `false` if it was alone. Any other
    /// stack tries the footprint tiles in probe order. Returns whether
    /// anything moved or merged.
    pub fn shuffle_stacks_within_city(&mut self, id: StackId) -> bool {
        let Some(stack) = self.world.stack(id) else {
            return false;
        };
        let pos = stack.pos;
        let Some(city) = self
            .world
            .city_at(pos)
            .filter(|c| c.owner == self.player)
            .map(|c| c.id)
        else {
            return false;
        };
        let Some(origin) = self.world.city(city).map(|c| c.pos) else {
            return false;
        };

        if pos == origin {
            if self.world.armies_at(origin, self.player, Some(id)) == 0 {
                return false;
            }
            self.world.merge_tile(origin, self.player);
            return true;
        }
        self.shuffle_stack(id, city, 0)
    }

    /// Tries footprint tile `offset` and moves on to the next one when it
    /// cannot take the stack.
    fn shuffle_stack(&mut self, id: StackId, city: CityId, offset: usize) -> bool {
        let Some(&(dx, dy)) = CITY_OFFSETS.get(offset) else {
            return false;
        };
        let Some(origin) = self.world.city(city).map(|c| c.pos) else {
            return false;
        };
        let Some(stack) = self.world.stack(id) else {
            return false;
        };
        let target = origin.offset(dx, dy);
        if target == stack.pos {
            self.set_parked(id, true);
            return false;
        }
        if !self.world.can_join(target, self.player, stack.size(), Some(id)) {
            return self.shuffle_stack(id, city, offset + 1);
        }

        let moved = self.move_to(id, target).map_or(false, |o| o.moved);
        if moved {
            for other in self.world.stacks_at(target) {
                if self.world.stack(other).map_or(false, |s| s.owner == self.player) {
                    self.set_parked(other, true);
                }
            }
        }
        moved
    }

    /// Sends stacks out of crowded cities toward the nearest enemy city.
    ///
    /// A city sheds stacks while it holds more armies than the configured
    /// threshold and the owner can pay upkeep for another sortie. When the
    /// city is close to full a stack always leaves, otherwise it is a coin
    /// flip.
    pub fn empty_out_cities(&mut self) -> usize {
        let player = self.player;
        let cities: Vec<CityId> = self
            .world
            .cities_of(player)
            .filter(|c| !c.burnt)
            .map(|c| c.id)
            .collect();
        let gold = self.world.player(player).map_or(0, |p| p.gold);
        let budget = match self.config.upkeep_gold_per_stack {
            0 => usize::MAX,
            per_stack => (gold / per_stack) as usize,
        };
        let probability = self.config.empty_out_probability.clamp(0.0, 1.0);

        let mut sent = 0;
        let mut moved = 0;
        for city in cities {
            if self.cancelled() {
                break;
            }
            self.beat();
            loop {
                let garrison = self.world.armies_in_city(city, player);
                if garrison <= self.config.empty_out_min_armies || sent >= budget {
                    break;
                }
                let crowded = garrison >= CITY_CAPACITY - MAX_STACK_SIZE;
                if !crowded && !self.rng.gen_bool(probability) {
                    break;
                }
                let leaver = self
                    .world
                    .stacks_in_city(city, Some(player))
                    .into_iter()
                    .find(|id| self.stacks.contains(*id) && self.world.stack(*id).map_or(false, |s| !s.parked));
                let Some(id) = leaver else {
                    break;
                };
                let Some((target, dest)) = self.nearest_enemy_city(id) else {
                    break;
                };
                debug!(stack = id.0, city = city.0, target = target.0, garrison, "thinning out city");
                match self.move_to(id, dest) {
                    Some(outcome) => {
                        sent += 1;
                        moved += self.settle_move(id, outcome);
                    }
                    None => {
                        self.stacks.remove(id);
                    }
                }
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use crate::ai::testkit::Fixture;
    use crate::board::{Diplomacy, Position, NEUTRAL};

    #[test]
    fn lone_stack_on_origin_stays_put() {
        let mut fx = Fixture::new(12);
        fx.world.add_city("Home", Position::new(4, 4), fx.me);
        let s = fx.stack(fx.me, Position::new(4, 4), &[3]);
        let mut alloc = fx.allocator(&[]);
        assert!(!alloc.shuffle_stacks_within_city(s));
        assert_eq!(alloc.world().stack(s).unwrap().pos, Position::new(4, 4));
    }

    #[test]
    fn stacks_on_origin_merge() {
        let mut fx = Fixture::new(12);
        fx.world.add_city("Home", Position::new(4, 4), fx.me);
        let first = fx.stack(fx.me, Position::new(4, 4), &[3, 3]);
        let second = fx.stack(fx.me, Position::new(4, 4), &[2]);
        let mut alloc = fx.allocator(&[]);
        assert!(alloc.shuffle_stacks_within_city(second));
        assert_eq!(alloc.world().stack(first).unwrap().size(), 3);
        assert!(alloc.world().stack(second).is_none());
    }

    #[test]
    fn shuffle_walks_to_free_origin() {
        let mut fx = Fixture::new(12);
        fx.world.add_city("Home", Position::new(4, 4), fx.me);
        let s = fx.stack(fx.me, Position::new(5, 5), &[3]);
        let mut alloc = fx.allocator(&[]);
        assert!(alloc.shuffle_stacks_within_city(s));
        let stack = alloc.world().stack(s).unwrap();
        assert_eq!(stack.pos, Position::new(4, 4));
        assert!(stack.parked);
    }

    #[test]
    fn shuffle_skips_full_tiles_and_parks_in_place() {
        let mut fx = Fixture::new(12);
        fx.world.add_city("Home", Position::new(4, 4), fx.me);
        fx.stack(fx.me, Position::new(4, 4), &[1; 8]);
        fx.stack(fx.me, Position::new(4, 5), &[1; 8]);
        let s = fx.stack(fx.me, Position::new(5, 4), &[3]);
        let mut alloc = fx.allocator(&[]);
        assert!(!alloc.shuffle_stacks_within_city(s));
        let stack = alloc.world().stack(s).unwrap();
        assert_eq!(stack.pos, Position::new(5, 4));
        assert!(stack.parked);
    }

    #[test]
    fn failed_shuffle_leaves_occupant_free() {
        let mut fx = Fixture::new(12);
        fx.world.add_city("Home", Position::new(4, 4), fx.me);
        let occupant = fx.stack(fx.me, Position::new(4, 4), &[2, 2]);
        let tired = fx.stack(fx.me, Position::new(5, 5), &[3]);
        for army in &mut fx.world.stack_mut(tired).unwrap().armies {
            army.moves = 0;
        }
        let mut alloc = fx.allocator(&[]);
        assert!(!alloc.shuffle_stacks_within_city(tired));
        assert_eq!(alloc.world().stack(tired).unwrap().pos, Position::new(5, 5));
        assert!(!alloc.world().stack(occupant).unwrap().parked);
        assert!(alloc.working_set().contains(occupant));
    }

    #[test]
    fn crowded_city_sends_a_stack_out() {
        let mut fx = Fixture::new(30);
        fx.world.add_city("Home", Position::new(4, 4), fx.me);
        fx.world.add_city("Kor", Position::new(20, 4), NEUTRAL);
        let first = fx.stack(fx.me, Position::new(4, 4), &[2; 8]);
        fx.stack(fx.me, Position::new(4, 5), &[2; 8]);
        fx.stack(fx.me, Position::new(5, 4), &[2; 8]);

        let mut alloc = fx.allocator(&[]);
        assert_eq!(alloc.empty_out_cities(), 1);
        assert!(!alloc.working_set().contains(first));
        assert!(alloc.world().stack(first).unwrap().pos.x > 5);
        assert_eq!(alloc.working_set().len(), 2);
    }

    #[test]
    fn empty_out_respects_gold() {
        let mut fx = Fixture::new(30);
        fx.world.players[fx.me.0 as usize].gold = 0;
        fx.world.add_city("Home", Position::new(4, 4), fx.me);
        fx.world.add_city("Kor", Position::new(20, 4), NEUTRAL);
        fx.stack(fx.me, Position::new(4, 4), &[2; 8]);
        fx.stack(fx.me, Position::new(4, 5), &[2; 8]);
        fx.stack(fx.me, Position::new(5, 4), &[2; 8]);
        let mut alloc = fx.allocator(&[]);
        assert_eq!(alloc.empty_out_cities(), 0);
        assert_eq!(alloc.working_set().len(), 3);
    }

    #[test]
    fn default_move_declares_war_on_foreign_target() {
        let mut fx = Fixture::new(30);
        fx.world.diplomacy = Diplomacy::new(true);
        fx.world.add_city("Dunethal", Position::new(20, 20), fx.foe);
        let s = fx.stack(fx.me, Position::new(2, 2), &[4]);
        let foe = fx.foe;

        let mut alloc = fx.allocator(&[]);
        assert_eq!(alloc.default_stack_movements(), 1);
        assert_eq!(alloc.stats().wars_declared, 1);
        assert!(alloc.world().is_hostile(alloc.player(), foe));
        assert!(alloc.world().stack(s).unwrap().pos.x > 2);
    }

    #[test]
    fn unreachable_sortie_costs_no_upkeep() {
        let mut fx = Fixture::new(30);
        fx.world.players[fx.me.0 as usize].gold = 10;
        fx.world.add_city("Home", Position::new(0, 0), fx.me);
        fx.world.add_city("Kor", Position::new(20, 0), NEUTRAL);
        let boxed = fx.stack(fx.me, Position::new(0, 0), &[2; 8]);
        let second = fx.stack(fx.me, Position::new(0, 1), &[2; 8]);
        fx.stack(fx.me, Position::new(1, 0), &[2; 8]);
        fx.stack(fx.me, Position::new(1, 1), &[2; 8]);

        let mut alloc = fx.allocator(&[]);
        assert_eq!(alloc.empty_out_cities(), 1);
        assert!(!alloc.working_set().contains(boxed));
        assert_eq!(alloc.world().stack(boxed).unwrap().pos, Position::new(0, 0));
        assert!(!alloc.working_set().contains(second));
        assert!(alloc.world().stack(second).unwrap().pos.x > 1);
        assert_eq!(alloc.working_set().len(), 2);
    }

    #[test]
    fn no_war_without_a_path() {
        let mut fx = Fixture::new(30);
        fx.world.diplomacy = Diplomacy::new(true);
        fx.world.add_city("Dunethal", Position::new(20, 20), fx.foe);
        let boxed = fx.stack(fx.me, Position::new(0, 0), &[4]);
        for at in [(1, 0), (0, 1), (1, 1)] {
            let wall = fx.stack(fx.me, Position::new(at.0, at.1), &[1; 8]);
            fx.world.stack_mut(wall).unwrap().parked = true;
        }
        let foe = fx.foe;

        let mut alloc = fx.allocator(&[]);
        assert_eq!(alloc.default_stack_movements(), 0);
        assert_eq!(alloc.stats().wars_declared, 0);
        assert!(!alloc.world().is_hostile(alloc.player(), foe));
        assert!(alloc.working_set().contains(boxed));
        assert_eq!(alloc.world().stack(boxed).unwrap().pos, Position::new(0, 0));
    }

    #[test]
    fn reinforced_city_keeps_its_stack() {
        let mut fx = Fixture::new(30);
        let home = fx.world.add_city("Home", Position::new(4, 4), fx.me);
        fx.world.add_city("Dunethal", Position::new(20, 20), fx.foe);
        fx.analysis.danger.insert(home, 9.0);
        let s = fx.stack(fx.me, Position::new(5, 5), &[2]);

        let mut alloc = fx.allocator(&[]);
        assert_eq!(alloc.default_stack_movements(), 1);
        assert!(!alloc.working_set().contains(s));
        assert_eq!(alloc.world().stack(s).unwrap().pos, Position::new(4, 4));
    }
}
