//! Shared fixtures for the allocation unit tests.

use std::collections::HashMap;

use crate::analysis::{Analysis, Threat};
use crate::board::{Army, CityId, Map, PlayerId, Position, StackId, Terrain, World};
use crate::movement::PathMover;
use crate::sites::SiteVisitor;

use super::{AllocationConfig, Allocator, Collaborators};

/// Scores armies by raw strength; city danger comes from a fixed table.
#[derive(Default)]
pub(crate) struct RawStrength {
    pub danger: HashMap<CityId, f32>,
}

impl Analysis for RawStrength {
    fn army_strength(&self, army: &Army) -> f32 {
        army.strength as f32
    }

    fn city_danger(&self, _: &World, city: CityId) -> f32 {
        self.danger.get(&city).copied().unwrap_or(0.0)
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
        let garrison: f32 = world
            .stacks_in_city(city, Some(owner))
            .iter()
            .filter_map(|id| world.stack(*id))
            .map(|s| self.stack_strength(s))
            .sum();
        self.city_danger(world, city) - garrison
    }
}

pub(crate) struct Fixture {
    pub world: World,
    pub me: PlayerId,
    pub foe: PlayerId,
    pub config: AllocationConfig,
    pub analysis: RawStrength,
    pub mover: PathMover,
    pub sites: SiteVisitor,
}

impl Fixture {
    pub fn new(size: i32) -> Self {
        let mut world = World::new(Map::filled(size, size, Terrain::Grass));
        let me = world.add_player("Sirians", 100);
        let foe = world.add_player("Lord Bane", 100);
        Fixture {
            world,
            me,
            foe,
            config: AllocationConfig::default(),
            analysis: RawStrength::default(),
            mover: PathMover::new(),
            sites: SiteVisitor::default(),
        }
    }

    /// Adds a stack of plain armies with the given strengths.
    pub fn stack(&mut self, owner: PlayerId, pos: Position, strengths: &[u32]) -> StackId {
        let armies = strengths
            .iter()
            .map(|&s| self.world.new_army("Infantry", s, 12))
            .collect();
        self.world.add_stack(owner, pos, armies)
    }

    pub fn allocator<'a>(&'a mut self, threats: &'a [Threat]) -> Allocator<'a> {
        Allocator::new(
            &mut self.world,
            self.me,
            threats,
            &self.config,
            Collaborators {
                analysis: &self.analysis,
                mover: &mut self.mover,
                sites: &mut self.sites,
            },
        )
    }
}
