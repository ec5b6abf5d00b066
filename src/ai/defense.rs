//! Garrison sizing.

use tracing::debug;

use crate::analysis::determine_weak_armies;
use crate::board::{CityId, StackId};

use super::allocation::Allocator;

impl Allocator<'_> {
    /// Sizes the garrison of every standing city the faction owns.
    ///
    /// The requirement is the city's live danger clamped to the configured
    /// floor and ceiling. Stacks already committed elsewhere count toward it
    /// first. Available stacks in the city are then kept as defenders one by
    /// one until the requirement is met; the one that tips it over sheds its
    /// weakest armies into a new stack when that still leaves enough behind.
    /// Only stacks already in place are used. An under-garrisoned city is
    /// reported, nothing is recalled to it.
    ///
    /// Defenders do not move, so this phase always returns 0.
    pub fn allocate_defensive_stacks(&mut self) -> usize {
        let analysis = self.analysis;
        let cities: Vec<CityId> = self
            .world
            .cities_of(self.player)
            .filter(|c| !c.burnt)
            .map(|c| c.id)
            .collect();

        for city in cities {
            if self.cancelled() {
                break;
            }
            self.beat();

            let required = analysis
                .city_danger(self.world, city)
                .clamp(self.config.defense_floor, self.config.defense_ceiling);

            let mut total = 0.0f32;
            let mut candidates: Vec<StackId> = Vec::new();
            for id in self.world.stacks_in_city(city, Some(self.player)) {
                if self.stacks.contains(id) {
                    candidates.push(id);
                } else {
                    total += self.strength(id);
                }
            }

            for id in candidates {
                if total >= required {
                    break;
                }
                if !self.available(id) {
                    continue;
                }
                total += self.strength(id);

                if total > required {
                    let excess = total - required;
                    let weak = self.world.stack(id).and_then(|stack| {
                        let weak = determine_weak_armies(analysis, stack, excess);
                        (!weak.is_empty() && weak.len() < stack.size()).then_some(weak)
                    });
                    if let Some(new) = weak.and_then(|armies| self.split_off(id, &armies)) {
                        total -= self.strength(new);
                        let can_move = self.world.stack(new).map_or(false, |s| s.moves() > 0);
                        if can_move {
                            self.stacks.add(new);
                        }
                    }
                }

                self.stacks.remove(id);
                if let Some(stack) = self.world.stack_mut(id) {
                    stack.defending = true;
                }
                self.stats.defenders += 1;
                debug!(stack = id.0, city = city.0, total, required, "kept as defender");
            }

            if total < required {
                self.report_shortfall(city, required - total);
            }
        }
        0
    }

    /// Logs a garrison shortfall. Stacks are not recalled to cover it.
    fn report_shortfall(&mut self, city: CityId, shortfall: f32) {
        self.stats.undefended_cities += 1;
        let candidate = self.find_closest_stack_to_city(city);
        debug!(
            city = city.0,
            shortfall,
            candidate = ?candidate.map(|id| id.0),
            "garrison short, recall disabled"
        );
    }
}
