//! Strength and danger assessment.
//!
//! The allocation engine never scores anything itself. It asks an
//! `Analysis` implementation how strong a stack is and how endangered a city
//! is, and it consumes a precomputed list of `Threat`s. `ThreatAnalysis` is
//! the heuristic implementation used by the game driver.

pub(crate) mod heuristic;
pub mod threat;

use serde::Deserialize;

use crate::board::{Army, ArmyId, CityId, Stack, World};

pub use heuristic::ThreatAnalysis;
pub use threat::{Threat, ThreatKind};

/// Tuning for `ThreatAnalysis`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Effective army strength is divided by this to get a score.
    pub strength_scale: f32,
    /// Hostile stacks farther than this from a city do not endanger it.
    pub danger_radius: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            strength_scale: 10.0,
            danger_radius: 12,
        }
    }
}

/// The strength-scoring collaborator.
pub trait Analysis {
    /// Score of a single army.
    fn army_strength(&self, army: &Army) -> f32;

    /// Score of a whole stack.
    fn stack_strength(&self, stack: &Stack) -> f32 {
        stack.armies.iter().map(|a| self.army_strength(a)).sum()
    }

    /// Live danger to a city from hostile stacks around it.
    fn city_danger(&self, world: &World, city: CityId) -> f32;

    /// Number of the owner's armies inside the city.
    fn defenders_in_city(&self, world: &World, city: CityId) -> usize;

    /// Danger not yet covered by the garrison; negative when over-garrisoned.
    fn reinforcements_needed(&self, world: &World, city: CityId) -> f32;
}

/// Picks the weakest armies whose combined score stays within `excess`.
///
/// Splitting these off leaves a stack that is still at least as strong as
/// the requirement the excess was measured against.
pub fn determine_weak_armies(analysis: &dyn Analysis, stack: &Stack, excess: f32) -> Vec<ArmyId> {
    let mut scored: Vec<(f32, ArmyId)> = stack
        .armies
        .iter()
        .map(|a| (analysis.army_strength(a), a.id))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut picked = Vec::new();
    let mut total = 0.0f32;
    for (score, id) in scored {
        if total + score > excess + f32::EPSILON {
            break;
        }
        total += score;
        picked.push(id);
    }
    picked
}

/// Picks the strongest armies until their combined score reaches `minimum`.
///
/// Always picks at least one army from a non-empty stack. Returns every army
/// when the whole stack is needed.
pub fn determine_strong_armies(analysis: &dyn Analysis, stack: &Stack, minimum: f32) -> Vec<ArmyId> {
    let mut scored: Vec<(f32, ArmyId)> = stack
        .armies
        .iter()
        .map(|a| (analysis.army_strength(a), a.id))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut picked = Vec::new();
    let mut total = 0.0f32;
    for (score, id) in scored {
        if !picked.is_empty() && total >= minimum {
            break;
        }
        total += score;
        picked.push(id);
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{PlayerId, Position, StackId};

    /// Scores armies by their raw strength.
    struct RawStrength;

    impl Analysis for RawStrength {
        fn army_strength(&self, army: &Army) -> f32 {
            army.strength as f32
        }
        fn city_danger(&self, _: &World, _: CityId) -> f32 {
            0.0
        }
        fn defenders_in_city(&self, _: &World, _: CityId) -> usize {
            0
        }
        fn reinforcements_needed(&self, _: &World, _: CityId) -> f32 {
            0.0
        }
    }

    fn stack_of(strengths: &[u32]) -> Stack {
        let armies = strengths
            .iter()
            .enumerate()
            .map(|(i, &s)| Army::new(ArmyId(i as u32), "Infantry", s, 12))
            .collect();
        Stack::new(StackId(1), PlayerId(1), Position::new(0, 0), armies)
    }

    #[test]
    fn weak_armies_fit_within_excess() {
        let stack = stack_of(&[4, 1, 3, 2]);
        let weak = determine_weak_armies(&RawStrength, &stack, 3.0);
        assert_eq!(weak, vec![ArmyId(1), ArmyId(3)]);
    }

    #[test]
    fn weak_armies_empty_when_excess_too_small() {
        let stack = stack_of(&[4, 5]);
        assert!(determine_weak_armies(&RawStrength, &stack, 1.0).is_empty());
    }

    #[test]
    fn strong_armies_reach_minimum() {
        let stack = stack_of(&[1, 5, 2, 4]);
        let strong = determine_strong_armies(&RawStrength, &stack, 8.0);
        assert_eq!(strong, vec![ArmyId(1), ArmyId(3)]);
    }

    #[test]
    fn strong_armies_take_one_for_zero_minimum() {
        let stack = stack_of(&[1, 5, 2]);
        assert_eq!(determine_strong_armies(&RawStrength, &stack, 0.0), vec![ArmyId(1)]);
    }

    #[test]
    fn strong_armies_whole_stack_when_too_weak() {
        let stack = stack_of(&[1, 2]);
        assert_eq!(determine_strong_armies(&RawStrength, &stack, 10.0).len(), 2);
    }

    #[test]
    fn stack_strength_defaults_to_sum() {
        let stack = stack_of(&[1, 2, 3]);
        assert_eq!(RawStrength.stack_strength(&stack), 6.0);
    }
}
