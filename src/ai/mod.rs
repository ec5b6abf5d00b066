//! The per-turn stack allocation engine.
//!
//! `Allocator` owns a `WorkingSet` of one faction's available stacks and runs
//! a fixed pipeline of phases over it. Every phase takes stacks out of the set
//! as it commits them, so no stack is given two jobs in one turn.

pub mod allocation;
mod defense;
mod fallback;
mod offense;
mod opportunistic;
mod select;
#[cfg(test)]
mod testkit;
pub mod working_set;

use serde::Deserialize;

pub use allocation::{AllocationStats, Allocator, Collaborators, Heartbeat, Phase};
pub use working_set::WorkingSet;

/// Tuning for the allocation phases.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Radius scanned around hostile cities and around each stack for
    /// nearby targets.
    pub attack_scan_radius: u32,
    /// Movement points a stack needs to be sent at a nearby city.
    pub min_attack_moves: u32,
    /// Stacks farther than this from an enemy city are not considered.
    pub enemy_city_max_distance: u32,
    /// Tiles a stack is assumed to cover per turn when estimating moves.
    pub tiles_per_move: u32,
    /// Stacks farther than this from a threat are not sent at it.
    pub best_attacker_radius: u32,
    /// Armies a city should keep when a stack leaves it.
    pub min_city_defenders: usize,
    /// Extra armies on top of `min_city_defenders` before anyone may leave.
    pub departure_margin: usize,
    /// Required garrison strength is the city's danger clamped to
    /// `defense_floor..=defense_ceiling`.
    pub defense_floor: f32,
    pub defense_ceiling: f32,
    /// City threats at or below this danger are taken by a single stack.
    pub capacity_danger_threshold: f32,
    /// Strength sent on top of a lightly defended city's danger.
    pub capacity_force_margin: f32,
    /// A threat counts as covered once less than this share of its danger
    /// is left unanswered.
    pub threat_satisfied_fraction: f32,
    /// Stacks with a path and at least this many moves get parked.
    pub park_min_moves: u32,
    /// Cities holding more armies than this send some away.
    pub empty_out_min_armies: usize,
    /// Chance a city below near-full capacity still sends a stack out.
    pub empty_out_probability: f64,
    /// Gold a player needs per stack sent out of a crowded city.
    pub upkeep_gold_per_stack: u32,
    /// Leave stacks parked on earlier turns out of the working set.
    pub skip_parked: bool,
    pub seed: u64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        AllocationConfig {
            attack_scan_radius: 2,
            min_attack_moves: 4,
            enemy_city_max_distance: 51,
            tiles_per_move: 7,
            best_attacker_radius: 27,
            min_city_defenders: 3,
            departure_margin: 4,
            defense_floor: 3.0,
            defense_ceiling: 10.0,
            capacity_danger_threshold: 0.5003,
            capacity_force_margin: 0.5,
            threat_satisfied_fraction: 0.1,
            park_min_moves: 4,
            empty_out_min_armies: 16,
            empty_out_probability: 0.5,
            upkeep_gold_per_stack: 10,
            skip_parked: true,
            seed: 0,
        }
    }
}

impl AllocationConfig {
    /// Armies a city must keep beyond the departing stack.
    pub fn garrison_floor(&self) -> usize {
        self.min_city_defenders + self.departure_margin
    }
}
