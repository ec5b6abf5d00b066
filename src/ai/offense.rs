//! Attack phases: continuing attacks, nearby targets, capacity building and
//! threat allocation.

use tracing::{debug, warn};

use crate::analysis::{determine_strong_armies, Threat};
use crate::board::{CityId, Position, StackId};

use super::allocation::Allocator;

/// Slack used when comparing remaining danger against zero-ish bounds.
const DANGER_EPSILON: f32 = 1e-4;

impl Allocator<'_> {
    /// True for standing cities the faction is at war with (neutrals
    /// included).
    pub(super) fn is_enemy_city(&self, city: CityId) -> bool {
        self.world.city(city).map_or(false, |c| {
            !c.burnt && c.owner != self.player && self.world.is_hostile(self.player, c.owner)
        })
    }

    /// Nearest standing enemy city to `id`, with the tile to head for.
    pub(super) fn nearest_enemy_city(&self, id: StackId) -> Option<(CityId, Position)> {
        let pos = self.world.stack(id)?.pos;
        let city = self.world.nearest_city(pos, |c| self.is_enemy_city(c.id))?;
        Some((city, self.world.city(city)?.closest_tile(pos)))
    }

    /// Keeps walking paths that lead into a city that is still the enemy's.
    ///
    /// Paths into a city the faction has since taken are dropped instead.
    pub fn continue_attacks(&mut self) -> usize {
        let mut moved = 0;
        for id in self.stacks.ids() {
            if self.cancelled() {
                break;
            }
            if !self.available(id) {
                continue;
            }
            let Some(stack) = self.world.stack(id) else {
                continue;
            };
            let Some(dest) = stack.destination() else {
                continue;
            };
            let Some(city) = self.world.city_at(dest) else {
                continue;
            };
            if city.burnt || city.contains(stack.pos) {
                continue;
            }
            if city.owner == self.player {
                debug!(stack = id.0, city = city.id.0, "target already ours, dropping path");
                if let Some(s) = self.world.stack_mut(id) {
                    s.clear_path();
                }
                continue;
            }
            if !self.is_enemy_city(city.id) {
                continue;
            }
            let outcome = self.continue_path(id);
            moved += self.settle_move(id, outcome);
        }
        moved
    }

    /// Strikes at targets right next to the faction's stacks.
    ///
    /// First every hostile city gets the strongest stack close enough with
    /// moves to spare. Then every stack engages a hostile field stack nearby
    /// that is no stronger than itself and shares its land or water domain.
    /// Finally fully rested hero stacks and full stacks idling in the
    /// faction's cities head for the nearest enemy city.
    pub fn attack_nearby_enemies(&mut self) -> usize {
        let radius = self.config.attack_scan_radius;
        let mut moved = 0;

        let cities: Vec<CityId> = self
            .world
            .cities
            .iter()
            .map(|c| c.id)
            .filter(|c| self.is_enemy_city(*c))
            .collect();
        for city in cities {
            if self.cancelled() {
                return moved;
            }
            self.beat();
            if !self.is_enemy_city(city) {
                continue;
            }
            let Some(target) = self.world.city(city) else {
                continue;
            };
            let mut best: Option<(f32, StackId)> = None;
            for id in self.stacks.iter() {
                let Some(stack) = self.world.stack(id) else {
                    continue;
                };
                if stack.parked
                    || target.contains(stack.pos)
                    || target.distance(stack.pos) > radius
                    || stack.moves() < self.config.min_attack_moves
                {
                    continue;
                }
                let score = self.analysis.stack_strength(stack);
                if best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, id));
                }
            }
            let Some((_, id)) = best else {
                continue;
            };
            let Some(dest) = self.world.stack(id).map(|s| target.closest_tile(s.pos)) else {
                continue;
            };
            debug!(stack = id.0, city = city.0, "attacking nearby city");
            if let Some(outcome) = self.move_to(id, dest) {
                moved += self.settle_move(id, outcome);
            }
        }

        for id in self.stacks.ids() {
            if self.cancelled() {
                return moved;
            }
            if !self.available(id) {
                continue;
            }
            let Some(stack) = self.world.stack(id) else {
                continue;
            };
            let naval = self.world.map.is_water(stack.pos);
            let strength = self.analysis.stack_strength(stack);
            let prey = self
                .world
                .stacks_within(stack.pos, radius)
                .into_iter()
                .filter_map(|other| self.world.stack(other))
                .find(|other| {
                    self.world.is_hostile(self.player, other.owner)
                        && self.world.city_at(other.pos).is_none()
                        && self.world.map.is_water(other.pos) == naval
                        && self.analysis.stack_strength(other) <= strength
                })
                .map(|other| other.pos);
            let Some(dest) = prey else {
                continue;
            };
            debug!(stack = id.0, x = dest.x, y = dest.y, "engaging nearby stack");
            if let Some(outcome) = self.move_to(id, dest) {
                moved += self.settle_move(id, outcome);
            }
        }

        for id in self.stacks.ids() {
            if self.cancelled() {
                return moved;
            }
            if !self.available(id) {
                continue;
            }
            let Some(stack) = self.world.stack(id) else {
                continue;
            };
            let in_own_city = self
                .world
                .city_at(stack.pos)
                .map_or(false, |c| c.owner == self.player);
            let eager = stack.is_fully_rested() && (stack.has_hero() || stack.is_full());
            if !in_own_city || !eager {
                continue;
            }
            let Some((city, dest)) = self.nearest_enemy_city(id) else {
                continue;
            };
            debug!(stack = id.0, city = city.0, "rested stack leaves for enemy city");
            if let Some(outcome) = self.move_to(id, dest) {
                moved += self.settle_move(id, outcome);
            }
        }

        moved
    }

    /// Sends a minimal force at every lightly defended city.
    ///
    /// `preferred` is tried first. Neutral cities are skipped unless
    /// `take_neutrals`.
    pub fn allocate_stacks_to_capacity_building(
        &mut self,
        preferred: Option<CityId>,
        take_neutrals: bool,
    ) -> usize {
        let threats = self.threats;
        let analysis = self.analysis;
        let mut order: Vec<&Threat> = threats
            .iter()
            .filter(|t| {
                let Some(city) = t.city().and_then(|c| self.world.city(c)) else {
                    return false;
                };
                t.danger() <= self.config.capacity_danger_threshold
                    && city.owner != self.player
                    && (take_neutrals || !self.world.is_neutral(city.owner))
            })
            .collect();
        if let Some(first) = preferred {
            if let Some(i) = order.iter().position(|t| t.city() == Some(first)) {
                let threat = order.remove(i);
                order.insert(0, threat);
            }
        }

        let mut moved = 0;
        for threat in order {
            if self.cancelled() {
                break;
            }
            self.beat();
            let Some(city) = threat.city() else {
                continue;
            };
            if threat.is_eliminated(self.world) {
                continue;
            }
            let Some(id) = self.find_closest_stack_to_enemy_city(city, true) else {
                continue;
            };
            let Some(pos) = self.world.stack(id).map(|s| s.pos) else {
                continue;
            };
            let Some(dest) = threat.closest_point(self.world, pos) else {
                continue;
            };
            match self.mover.estimate(self.world, id, dest) {
                Some(cost) if cost > 0 => {}
                _ => {
                    warn!(stack = id.0, city = city.0, "capacity target unreachable");
                    continue;
                }
            }

            let need = threat.danger() + self.config.capacity_force_margin;
            let strong = match self.world.stack(id) {
                Some(stack) if stack.size() > 1 => {
                    let picked = determine_strong_armies(analysis, stack, need);
                    (picked.len() < stack.size()).then_some(picked)
                }
                _ => None,
            };
            let split = strong.and_then(|armies| self.split_off(id, &armies));

            debug!(stack = id.0, city = city.0, split = split.is_some(), "taking lightly defended city");
            match split {
                Some(new) => {
                    if let Some(s) = self.world.stack_mut(id) {
                        s.clear_path();
                    }
                    let outcome = self.move_to(new, dest);
                    moved += self.settle_split(new, outcome);
                }
                None => {
                    let outcome = self.continue_path(id);
                    moved += self.settle_move(id, outcome);
                }
            }
        }
        moved
    }

    /// Throws the strongest available stacks at each city threat until its
    /// danger is answered.
    ///
    /// An attacker stronger than what is left of the danger only sends its
    /// strongest armies when that leaves something behind. Stops early on a
    /// threat whose target fell during this turn.
    pub fn allocate_stacks_to_threats(&mut self) -> usize {
        let threats = self.threats;
        let analysis = self.analysis;
        let mut moved = 0;

        for threat in threats.iter().filter(|t| t.is_city()) {
            if self.cancelled() {
                break;
            }
            self.beat();
            if threat.is_eliminated(self.world) {
                continue;
            }

            let danger = threat.danger();
            let satisfied = danger * self.config.threat_satisfied_fraction + DANGER_EPSILON;
            let mut remaining = danger;
            let mut skip: Vec<StackId> = Vec::new();

            while remaining > 0.0 && remaining > satisfied {
                if self.cancelled() {
                    break;
                }
                let Some((id, home)) = self.find_best_attacker_for(threat, &skip) else {
                    break;
                };
                let Some(pos) = self.world.stack(id).map(|s| s.pos) else {
                    break;
                };
                let Some(dest) = threat.closest_point(self.world, pos) else {
                    debug!(stack = id.0, "threat already eliminated");
                    break;
                };
                match self.mover.estimate(self.world, id, dest) {
                    Some(cost) if cost > 0 => {}
                    _ => {
                        skip.push(id);
                        continue;
                    }
                }

                let score = self.strength(id);
                let mut attacker = id;
                if score > remaining {
                    let strong = self
                        .world
                        .stack(id)
                        .map(|s| (determine_strong_armies(analysis, s, remaining), s.size()));
                    if let Some((armies, size)) = strong {
                        if !armies.is_empty() && armies.len() < size {
                            if let Some(new) = self.split_off(id, &armies) {
                                if let Some(s) = self.world.stack_mut(id) {
                                    s.clear_path();
                                }
                                attacker = new;
                            }
                        }
                    }
                }

                let committed = self.strength(attacker);
                debug!(
                    stack = attacker.0,
                    home_defenders = ?home,
                    committed,
                    remaining,
                    "committing to threat"
                );
                let outcome = if attacker == id {
                    Some(self.continue_path(id))
                } else {
                    self.move_to(attacker, dest)
                };

                if attacker == id {
                    if let Some(outcome) = outcome {
                        moved += self.settle_move(id, outcome);
                    }
                } else {
                    let split_moved = outcome.map_or(false, |o| o.moved || o.died);
                    moved += self.settle_split(attacker, outcome);
                    if !split_moved {
                        skip.push(attacker);
                        continue;
                    }
                }

                remaining -= committed;
                if committed <= 0.0 || threat.strength(self.world, analysis) <= 0.0 {
                    break;
                }
            }
        }
        moved
    }
}
