//! Attacker and defender selection.
//!
//! Every finder walks the working set in insertion order and keeps the first
//! candidate on exact ties.

use crate::analysis::Threat;
use crate::board::{CityId, StackId};

use super::allocation::Allocator;

impl Allocator<'_> {
    /// Estimated turns for a stack `distance` tiles away to arrive.
    fn moves_needed(&self, distance: u32) -> u32 {
        distance.div_ceil(self.config.tiles_per_move.max(1))
    }

    /// Armies the stack's home city would keep if it left, or `None` when
    /// the stack is not in one of the faction's cities.
    pub(super) fn garrison_left_behind(&self, id: StackId) -> Option<(usize, usize)> {
        let stack = self.world.stack(id)?;
        let city = self
            .world
            .city_at(stack.pos)
            .filter(|c| c.owner == self.player)?;
        let defenders = self.analysis.defenders_in_city(self.world, city.id);
        Some((defenders, defenders.saturating_sub(stack.size())))
    }

    /// The available stack that could reach an enemy city in the fewest
    /// turns.
    ///
    /// Unless `try_harder`, stacks whose departure would leave their home
    /// city short of defenders are passed over.
    pub fn find_closest_stack_to_enemy_city(&self, city: CityId, try_harder: bool) -> Option<StackId> {
        let city = self.world.city(city)?;
        let mut best: Option<(u32, StackId)> = None;
        for id in self.stacks.iter() {
            let Some(stack) = self.world.stack(id) else {
                continue;
            };
            if stack.parked {
                continue;
            }
            let distance = city.distance(stack.pos);
            if distance > self.config.enemy_city_max_distance {
                continue;
            }
            let moves = self.moves_needed(distance);
            if !try_harder {
                if let Some((_, left)) = self.garrison_left_behind(id) {
                    if left < self.config.garrison_floor() {
                        continue;
                    }
                }
            }
            if best.map_or(true, |(m, _)| moves < m) {
                best = Some((moves, id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// The available stack that could reach one of the faction's cities in
    /// the fewest turns and still fit inside it.
    pub fn find_closest_stack_to_city(&self, city: CityId) -> Option<StackId> {
        let target = self.world.city(city)?;
        let free = self.world.free_capacity(city, self.player);
        let mut best: Option<(u32, StackId)> = None;
        for id in self.stacks.iter() {
            let Some(stack) = self.world.stack(id) else {
                continue;
            };
            if stack.parked || target.contains(stack.pos) || stack.size() > free {
                continue;
            }
            let distance = target.distance(stack.pos);
            if distance > self.config.enemy_city_max_distance {
                continue;
            }
            let moves = self.moves_needed(distance);
            if best.map_or(true, |(m, _)| moves < m) {
                best = Some((moves, id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// The strongest available stack within reach of `threat`.
    ///
    /// Stacks already on the threat, and stacks whose home city would be
    /// left at or below the garrison floor, are not candidates. Also returns
    /// the winner's home-city defender count, if it sits in a city.
    pub fn find_best_attacker_for(
        &self,
        threat: &Threat,
        skip: &[StackId],
    ) -> Option<(StackId, Option<usize>)> {
        let mut best: Option<(f32, StackId, Option<usize>)> = None;
        for id in self.stacks.iter() {
            if skip.contains(&id) {
                continue;
            }
            let Some(stack) = self.world.stack(id) else {
                continue;
            };
            if stack.parked {
                continue;
            }
            let point = threat.closest_point(self.world, stack.pos)?;
            let distance = point.distance(stack.pos);
            if distance == 0 || distance > self.config.best_attacker_radius {
                continue;
            }
            let home = self.garrison_left_behind(id);
            if let Some((_, left)) = home {
                if left <= self.config.garrison_floor() {
                    continue;
                }
            }
            let score = self.analysis.stack_strength(stack);
            if best.as_ref().map_or(true, |(s, _, _)| score > *s) {
                best = Some((score, id, home.map(|(defenders, _)| defenders)));
            }
        }
        best.map(|(_, id, defenders)| (id, defenders))
    }
}

#[cfg(test)]
mod tests {
    use crate::ai::testkit::Fixture;
    use crate::analysis::{Threat, ThreatKind};
    use crate::board::Position;

    #[test]
    fn closest_to_enemy_city_prefers_first_on_ties() {
        let mut fx = Fixture::new(40);
        let city = fx.world.add_city("Dunethal", Position::new(30, 30), fx.foe);
        let a = fx.stack(fx.me, Position::new(20, 20), &[3]);
        fx.stack(fx.me, Position::new(22, 22), &[3]);
        fx.stack(fx.me, Position::new(0, 0), &[9]);
        let alloc = fx.allocator(&[]);
        assert_eq!(alloc.find_closest_stack_to_enemy_city(city, false), Some(a));
    }

    #[test]
    fn closest_to_enemy_city_has_distance_cap() {
        let mut fx = Fixture::new(80);
        let city = fx.world.add_city("Dunethal", Position::new(70, 70), fx.foe);
        fx.stack(fx.me, Position::new(5, 5), &[3]);
        let alloc = fx.allocator(&[]);
        assert_eq!(alloc.find_closest_stack_to_enemy_city(city, true), None);
    }

    #[test]
    fn thin_garrison_only_leaves_when_trying_harder() {
        let mut fx = Fixture::new(20);
        fx.world.add_city("Home", Position::new(2, 2), fx.me);
        let target = fx.world.add_city("Dunethal", Position::new(12, 12), fx.foe);
        let guard = fx.stack(fx.me, Position::new(2, 2), &[2, 2, 2]);
        let alloc = fx.allocator(&[]);
        assert_eq!(alloc.find_closest_stack_to_enemy_city(target, false), None);
        assert_eq!(alloc.find_closest_stack_to_enemy_city(target, true), Some(guard));
    }

    #[test]
    fn best_attacker_is_strongest_in_range() {
        let mut fx = Fixture::new(40);
        let city = fx.world.add_city("Dunethal", Position::new(10, 10), fx.foe);
        fx.stack(fx.me, Position::new(3, 3), &[2]);
        fx.stack(fx.me, Position::new(4, 4), &[5]);
        let nine = fx.stack(fx.me, Position::new(5, 5), &[9]);
        fx.stack(fx.me, Position::new(6, 5), &[9]);
        fx.stack(fx.me, Position::new(10, 10), &[9, 9]);
        fx.stack(fx.me, Position::new(39, 39), &[9, 9, 9]);
        let threat = Threat {
            kind: ThreatKind::City(city),
            faction: fx.me,
            owner: fx.foe,
            danger: 10.0,
        };
        let alloc = fx.allocator(&[]);
        assert_eq!(alloc.find_best_attacker_for(&threat, &[]), Some((nine, None)));
    }

    #[test]
    fn best_attacker_honours_skip_list() {
        let mut fx = Fixture::new(20);
        let city = fx.world.add_city("Dunethal", Position::new(10, 10), fx.foe);
        let weak = fx.stack(fx.me, Position::new(3, 3), &[2]);
        let strong = fx.stack(fx.me, Position::new(4, 4), &[5]);
        let threat = Threat {
            kind: ThreatKind::City(city),
            faction: fx.me,
            owner: fx.foe,
            danger: 4.0,
        };
        let alloc = fx.allocator(&[]);
        assert_eq!(alloc.find_best_attacker_for(&threat, &[strong]), Some((weak, None)));
    }

    #[test]
    fn closest_to_city_needs_room() {
        let mut fx = Fixture::new(20);
        let home = fx.world.add_city("Home", Position::new(2, 2), fx.me);
        for tile in [(2, 2), (2, 3), (3, 2)] {
            fx.stack(fx.me, Position::new(tile.0, tile.1), &[1; 8]);
        }
        fx.stack(fx.me, Position::new(3, 3), &[1; 6]);
        fx.stack(fx.me, Position::new(6, 6), &[4, 4, 4]);
        let pair = fx.stack(fx.me, Position::new(8, 8), &[4, 4]);
        let alloc = fx.allocator(&[]);
        assert_eq!(alloc.find_closest_stack_to_city(home), Some(pair));
    }
}
