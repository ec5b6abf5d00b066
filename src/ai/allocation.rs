//! Turn driver for the allocation engine.
//!
//! An `Allocator` is built for one faction's turn. `run` walks the phases in
//! priority order, polling the stop flag between phases and inside the
//! costlier loops. Stopping early leaves the world consistent: every stack
//! that was moved has been fully settled, and calling `run` again on a fresh
//! allocator picks up whatever is left.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::{Analysis, Threat};
use crate::board::{ArmyId, CityId, PlayerId, Position, StackId, World};
use crate::movement::{MoveOutcome, Mover};
use crate::sites::{Opportunities, Visit};

use super::working_set::WorkingSet;
use super::AllocationConfig;

/// Progress notification, emitted per phase, per threat and per city.
pub trait Heartbeat {
    fn busy(&mut self);
}

impl<F: FnMut()> Heartbeat for F {
    fn busy(&mut self) {
        self()
    }
}

/// The allocation phases, in the order `run` executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    ContinueQuests,
    VisitTemples,
    VisitRuins,
    PickupItems,
    ContinueAttacks,
    AttackNearbyEnemies,
    CapacityBuilding,
    Defense,
    Threats,
    DefaultMovements,
    EmptyOutCities,
}

impl Phase {
    pub const ALL: [Phase; 11] = [
        Phase::ContinueQuests,
        Phase::VisitTemples,
        Phase::VisitRuins,
        Phase::PickupItems,
        Phase::ContinueAttacks,
        Phase::AttackNearbyEnemies,
        Phase::CapacityBuilding,
        Phase::Defense,
        Phase::Threats,
        Phase::DefaultMovements,
        Phase::EmptyOutCities,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::ContinueQuests => "continue_quests",
            Phase::VisitTemples => "visit_temples",
            Phase::VisitRuins => "visit_ruins",
            Phase::PickupItems => "pickup_items",
            Phase::ContinueAttacks => "continue_attacks",
            Phase::AttackNearbyEnemies => "attack_nearby_enemies",
            Phase::CapacityBuilding => "capacity_building",
            Phase::Defense => "defense",
            Phase::Threats => "threats",
            Phase::DefaultMovements => "default_movements",
            Phase::EmptyOutCities => "empty_out_cities",
        }
    }
}

/// Diagnostics gathered over one or more `run`s.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllocationStats {
    /// Stacks that took at least one step.
    pub moved: usize,
    /// Moved count per phase that ran.
    pub phases: Vec<(Phase, usize)>,
    pub splits: usize,
    pub deaths: usize,
    /// Stacks kept in place as city garrisons.
    pub defenders: usize,
    /// Cities whose garrison fell short of the requirement.
    pub undefended_cities: usize,
    pub wars_declared: usize,
    pub cancelled: bool,
}

impl AllocationStats {
    pub fn moved_in(&self, phase: Phase) -> usize {
        self.phases
            .iter()
            .filter(|(p, _)| *p == phase)
            .map(|(_, n)| n)
            .sum()
    }
}

/// External collaborators the allocator drives.
pub struct Collaborators<'a> {
    pub analysis: &'a dyn Analysis,
    pub mover: &'a mut dyn Mover,
    pub sites: &'a mut dyn Opportunities,
}

/// Allocates one faction's stacks for one turn.
pub struct Allocator<'a> {
    pub(super) world: &'a mut World,
    pub(super) player: PlayerId,
    pub(super) threats: &'a [Threat],
    pub(super) config: &'a AllocationConfig,
    pub(super) analysis: &'a dyn Analysis,
    pub(super) mover: &'a mut dyn Mover,
    pub(super) sites: &'a mut dyn Opportunities,
    pub(super) stacks: WorkingSet,
    pub(super) rng: SmallRng,
    pub(super) stats: AllocationStats,
    stop: Option<&'a AtomicBool>,
    heartbeat: Option<&'a mut dyn Heartbeat>,
}

impl<'a> Allocator<'a> {
    /// Builds the allocator and its working set from `player`'s roster.
    pub fn new(
        world: &'a mut World,
        player: PlayerId,
        threats: &'a [Threat],
        config: &'a AllocationConfig,
        with: Collaborators<'a>,
    ) -> Self {
        let stacks = WorkingSet::from_roster(world, player, config.skip_parked);
        let seed = config
            .seed
            .wrapping_add((world.turn as u64) << 8)
            .wrapping_add(player.0 as u64);
        Allocator {
            world,
            player,
            threats,
            config,
            analysis: with.analysis,
            mover: with.mover,
            sites: with.sites,
            stacks,
            rng: SmallRng::seed_from_u64(seed),
            stats: AllocationStats::default(),
            stop: None,
            heartbeat: None,
        }
    }

    /// Polls `stop` for cancellation.
    pub fn with_stop(mut self, stop: &'a AtomicBool) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: &'a mut dyn Heartbeat) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.stacks
    }

    pub fn working_set_mut(&mut self) -> &mut WorkingSet {
        &mut self.stacks
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn stats(&self) -> &AllocationStats {
        &self.stats
    }

    pub fn into_stats(self) -> AllocationStats {
        self.stats
    }

    /// Runs every phase in priority order and returns how many stacks moved.
    ///
    /// `preferred` is a city the capacity-building phase tries first;
    /// `take_neutrals` lets it go after neutral cities at all.
    pub fn run(&mut self, preferred: Option<CityId>, take_neutrals: bool) -> usize {
        let quests_enabled = self.world.quests_enabled;
        let mut total = 0;

        for phase in Phase::ALL {
            if self.cancelled() {
                self.stats.cancelled = true;
                info!(player = self.player.0, phase = phase.name(), "allocation cancelled");
                break;
            }
            if self.stacks.is_empty() {
                debug!(player = self.player.0, phase = phase.name(), "no stacks left");
                break;
            }
            self.beat();

            let moved = match phase {
                Phase::ContinueQuests => self.continue_quests(),
                Phase::VisitTemples => self.visit_temples(quests_enabled),
                Phase::VisitRuins => self.visit_ruins(),
                Phase::PickupItems => self.pickup_items(),
                Phase::ContinueAttacks => self.continue_attacks(),
                Phase::AttackNearbyEnemies => self.attack_nearby_enemies(),
                Phase::CapacityBuilding => {
                    self.allocate_stacks_to_capacity_building(preferred, take_neutrals)
                }
                Phase::Defense => self.allocate_defensive_stacks(),
                Phase::Threats => self.allocate_stacks_to_threats(),
                Phase::DefaultMovements => self.default_stack_movements(),
                Phase::EmptyOutCities => self.empty_out_cities(),
            };

            debug!(
                player = self.player.0,
                phase = phase.name(),
                moved,
                left = self.stacks.len(),
                "phase done"
            );
            self.stats.phases.push((phase, moved));
            total += moved;
        }

        self.stats.moved += total;
        total
    }

    /// Parks a stack so no later phase picks it.
    ///
    /// Unless forced, only stacks that still have a path and plenty of moves
    /// (they should have used them) or that cannot move at all are parked.
    pub fn set_parked(&mut self, id: StackId, force: bool) {
        let min_moves = self.config.park_min_moves;
        if let Some(stack) = self.world.stack_mut(id) {
            let moves = stack.moves();
            if force || (stack.has_path() && moves >= min_moves) || moves == 0 {
                stack.parked = true;
            }
        }
    }

    pub(super) fn cancelled(&self) -> bool {
        self.stop.map_or(false, |s| s.load(Ordering::Relaxed))
    }

    pub(super) fn beat(&mut self) {
        if let Some(heartbeat) = self.heartbeat.as_deref_mut() {
            heartbeat.busy();
        }
    }

    /// True when `id` is still in the working set, still exists and is not
    /// parked. Stacks that died or merged away are purged here.
    pub(super) fn available(&mut self, id: StackId) -> bool {
        if !self.stacks.contains(id) {
            return false;
        }
        match self.world.stack(id) {
            Some(stack) => !stack.parked,
            None => {
                self.stacks.remove(id);
                false
            }
        }
    }

    pub(super) fn strength(&self, id: StackId) -> f32 {
        self.world
            .stack(id)
            .map_or(0.0, |s| self.analysis.stack_strength(s))
    }

    /// Plans and walks a move. Returns `None` without touching the executor
    /// when no positive-cost path exists.
    pub(super) fn move_to(&mut self, id: StackId, dest: Position) -> Option<MoveOutcome> {
        match self.mover.estimate(self.world, id, dest) {
            Some(cost) if cost > 0 => {}
            _ => {
                debug!(stack = id.0, x = dest.x, y = dest.y, "no path");
                return None;
            }
        }
        let outcome = self.mover.execute(self.world, id);
        if outcome.died {
            self.stats.deaths += 1;
        }
        Some(outcome)
    }

    /// Walks the stack's existing path.
    pub(super) fn continue_path(&mut self, id: StackId) -> MoveOutcome {
        let outcome = self.mover.execute(self.world, id);
        if outcome.died {
            self.stats.deaths += 1;
        }
        outcome
    }

    /// Takes a stack that was given a move out of the working set.
    /// Returns 1 if it took a step.
    pub(super) fn settle_move(&mut self, id: StackId, outcome: MoveOutcome) -> usize {
        self.stacks.remove(id);
        if !outcome.died {
            self.set_parked(id, false);
        }
        usize::from(outcome.moved)
    }

    /// Settles a freshly split stack: parked if it moved, otherwise handed
    /// back to the working set for later phases.
    pub(super) fn settle_split(&mut self, id: StackId, outcome: Option<MoveOutcome>) -> usize {
        match outcome {
            Some(o) if o.died => 1,
            Some(o) if o.moved => {
                self.stacks.remove(id);
                self.set_parked(id, true);
                1
            }
            _ => {
                if let Some(stack) = self.world.stack_mut(id) {
                    stack.clear_path();
                    self.stacks.add(id);
                }
                0
            }
        }
    }

    /// Settles the result of an opportunistic visit.
    pub(super) fn settle_visit(&mut self, id: StackId, visit: Visit) -> usize {
        if visit.died {
            self.stats.deaths += 1;
            self.stacks.remove(id);
        } else if visit.moved || visit.done {
            self.stacks.remove(id);
            self.set_parked(id, false);
        } else if self.world.stack(id).is_none() {
            self.stacks.remove(id);
        }
        usize::from(visit.moved)
    }

    /// Splits `armies` off stack `id`, returning the new stack.
    pub(super) fn split_off(&mut self, id: StackId, armies: &[ArmyId]) -> Option<StackId> {
        let new = self.world.split_stack(id, armies)?;
        self.stats.splits += 1;
        debug!(stack = id.0, new = new.0, armies = armies.len(), "stack split");
        Some(new)
    }
}
