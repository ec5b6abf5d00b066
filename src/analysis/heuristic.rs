//! Heuristic threat analysis.
//!
//! Scores armies by effective strength, measures how much hostile strength
//! sits near each city (weighted by proximity) and turns every city the
//! faction does not own into a threat scored by its current garrison.
//! Hostile field stacks near the faction's cities become stack threats.

use crate::board::{Army, CityId, PlayerId, World};

use super::threat::{Threat, ThreatKind};
use super::{Analysis, AnalysisConfig};

/// Heuristic scoring for one faction's turn.
#[derive(Debug, Clone)]
pub struct ThreatAnalysis {
    player: PlayerId,
    config: AnalysisConfig,
}

impl ThreatAnalysis {
    pub fn new(player: PlayerId, config: AnalysisConfig) -> Self {
        ThreatAnalysis { player, config }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Strength of the stacks inside a city. Without an owner filter the
    /// faction's own stacks are left out.
    fn garrison_strength(&self, world: &World, city: CityId, owner: Option<PlayerId>) -> f32 {
        world
            .stacks_in_city(city, owner)
            .iter()
            .filter_map(|id| world.stack(*id))
            .filter(|s| s.owner != self.player || owner.is_some())
            .map(|s| self.stack_strength(s))
            .sum()
    }

    /// Builds the faction's threat list, most dangerous first.
    ///
    /// Ties keep city order, then stack order.
    pub fn threats(&self, world: &World) -> Vec<Threat> {
        let mut threats = Vec::new();

        for city in &world.cities {
            if city.burnt || city.owner == self.player {
                continue;
            }
            threats.push(Threat {
                kind: ThreatKind::City(city.id),
                faction: self.player,
                owner: city.owner,
                danger: self.garrison_strength(world, city.id, None),
            });
        }

        let radius = self.config.danger_radius;
        for stack in world.stacks.values() {
            if !world.is_hostile(self.player, stack.owner) || world.city_at(stack.pos).is_some() {
                continue;
            }
            let near_home = world
                .cities_of(self.player)
                .any(|c| c.distance(stack.pos) <= radius);
            if near_home {
                threats.push(Threat {
                    kind: ThreatKind::Stack(stack.id),
                    faction: self.player,
                    owner: stack.owner,
                    danger: self.stack_strength(stack),
                });
            }
        }

        threats.sort_by(|a, b| b.danger.total_cmp(&a.danger));
        threats
    }
}

impl Analysis for ThreatAnalysis {
    fn army_strength(&self, army: &Army) -> f32 {
        army.effective_strength() as f32 / self.config.strength_scale
    }

    fn city_danger(&self, world: &World, city: CityId) -> f32 {
        let Some(city) = world.city(city) else {
            return 0.0;
        };
        let radius = self.config.danger_radius;
        let mut danger = 0.0f32;
        for stack in world.stacks.values() {
            if !world.is_hostile(city.owner, stack.owner) {
                continue;
            }
            let d = city.distance(stack.pos);
            if d > radius {
                continue;
            }
            let proximity = 1.0 - d as f32 / (radius + 1) as f32;
            danger += self.stack_strength(stack) * proximity;
        }
        danger
    }

    fn defenders_in_city(&self, world: &World, city: CityId) -> usize {
        world
            .city(city)
            .map_or(0, |c| world.armies_in_city(city, c.owner))
    }

    fn reinforcements_needed(&self, world: &World, city: CityId) -> f32 {
        let Some(owner) = world.city(city).map(|c| c.owner) else {
            return 0.0;
        };
        self.city_danger(world, city) - self.garrison_strength(world, city, Some(owner))
    }
}
