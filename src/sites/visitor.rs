//! Reference implementation of the opportunistic collaborator.

use tracing::debug;

use crate::board::{ArmyId, PlayerId, Position, Quest, QuestKind, Reward, StackId, World};
use crate::movement::combat::{self, FightResult};
use crate::movement::Mover;

use super::{Opportunities, SiteConfig, Visit};

/// Sends stacks to the nearest worthwhile site within a configured radius.
#[derive(Debug, Clone, Default)]
pub struct SiteVisitor {
    config: SiteConfig,
}

/// Result of walking toward a site.
#[derive(Debug, Default)]
struct Trip {
    visit: Visit,
    arrived: bool,
}

/// Walks `stack` toward `dest` and reports whether any of its armies ended
/// up standing there. The stack may have merged into another one on arrival.
fn travel(world: &mut World, mover: &mut dyn Mover, stack: StackId, dest: Position) -> Trip {
    let Some(members) = world.stack(stack).map(|s| s.army_ids()) else {
        return Trip::default();
    };
    let Some(cost) = mover.estimate(world, stack, dest) else {
        return Trip::default();
    };
    let mut visit = Visit::default();
    if cost > 0 {
        let outcome = mover.execute(world, stack);
        visit.moved = outcome.moved;
        visit.died = outcome.died;
    }
    let arrived = !visit.died
        && world
            .stacks_at(dest)
            .iter()
            .filter_map(|id| world.stack(*id))
            .any(|s| s.armies.iter().any(|a| members.contains(&a.id)));
    Trip { visit, arrived }
}

/// First hero in the stack accepted by `filter`, with the stack's position
/// and owner.
fn hero_of<F>(world: &World, stack: StackId, filter: F) -> Option<(ArmyId, Position, PlayerId)>
where
    F: Fn(ArmyId) -> bool,
{
    let s = world.stack(stack)?;
    let hero = s.heroes().map(|h| h.id).find(|h| filter(*h))?;
    Some((hero, s.pos, s.owner))
}

impl SiteVisitor {
    pub fn new(config: SiteConfig) -> Self {
        SiteVisitor { config }
    }

    /// Nearest temple within range accepted by `filter`; first on ties.
    fn nearest_temple<F>(&self, world: &World, from: Position, filter: F) -> Option<usize>
    where
        F: Fn(usize) -> bool,
    {
        let mut best: Option<(u32, usize)> = None;
        for (i, temple) in world.temples.iter().enumerate() {
            let d = temple.pos.distance(from);
            if d > self.config.temple_radius || !filter(i) {
                continue;
            }
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, i));
            }
        }
        best.map(|(_, i)| i)
    }

    /// A fresh quest for `hero`: kill the nearest hostile hero, or failing
    /// that capture the nearest hostile city.
    fn pick_quest(&self, world: &World, hero: ArmyId, owner: PlayerId, from: Position) -> Option<Quest> {
        let mut target: Option<(u32, ArmyId)> = None;
        for stack in world.stacks.values() {
            if !world.is_hostile(owner, stack.owner) || world.is_neutral(stack.owner) {
                continue;
            }
            let d = stack.pos.distance(from);
            for enemy in stack.heroes() {
                if target.map_or(true, |(bd, _)| d < bd) {
                    target = Some((d, enemy.id));
                }
            }
        }
        let kind = match target {
            Some((_, enemy)) => QuestKind::KillHero(enemy),
            None => {
                let city = world.nearest_city(from, |c| !c.burnt && world.is_hostile(owner, c.owner))?;
                QuestKind::CaptureCity(city)
            }
        };
        Some(Quest {
            hero,
            owner,
            kind,
            deadline: world.turn + self.config.quest_turns,
        })
    }
}

impl Opportunities for SiteVisitor {
    fn continue_quest(&mut self, world: &mut World, mover: &mut dyn Mover, stack: StackId) -> Visit {
        let Some((hero, _, _)) = hero_of(world, stack, |h| world.quest_for(h).is_some()) else {
            return Visit::default();
        };
        let Some(target) = world.quest_for(hero).copied().and_then(|q| world.quest_target(&q)) else {
            return Visit::default();
        };
        let trip = travel(world, mover, stack, target);
        Visit {
            done: trip.arrived,
            ..trip.visit
        }
    }

    fn visit_temple_for_quest(&mut self, world: &mut World, mover: &mut dyn Mover, stack: StackId) -> Visit {
        if !world.quests_enabled {
            return Visit::default();
        }
        let Some((hero, pos, owner)) = hero_of(world, stack, |h| world.quest_for(h).is_none()) else {
            return Visit::default();
        };
        let Some(temple) = self.nearest_temple(world, pos, |_| true) else {
            return Visit::default();
        };
        let dest = world.temples[temple].pos;
        let trip = travel(world, mover, stack, dest);
        if !trip.arrived || world.stack_with_army(hero).is_none() {
            return trip.visit;
        }
        let Some(quest) = self.pick_quest(world, hero, owner, dest) else {
            return trip.visit;
        };
        debug!(hero = hero.0, kind = ?quest.kind, "quest taken");
        world.quests.push(quest);
        Visit {
            done: true,
            ..trip.visit
        }
    }

    fn visit_temple_for_blessing(&mut self, world: &mut World, mover: &mut dyn Mover, stack: StackId) -> Visit {
        let Some(s) = world.stack(stack) else {
            return Visit::default();
        };
        let (pos, owner) = (s.pos, s.owner);
        let min_fraction = self.config.blessing_min_fraction;
        let worth = |t: usize| {
            let unblessed = s.armies.iter().filter(|a| !a.is_blessed_at(t as u32)).count();
            !s.is_empty() && unblessed as f32 / s.size() as f32 >= min_fraction
        };
        let Some(temple) = self.nearest_temple(world, pos, worth) else {
            return Visit::default();
        };
        let dest = world.temples[temple].pos;
        let trip = travel(world, mover, stack, dest);
        if !trip.arrived {
            return trip.visit;
        }

        let mut blessed = 0;
        for id in world.stacks_at(dest) {
            let Some(s) = world.stack_mut(id) else {
                continue;
            };
            if s.owner != owner {
                continue;
            }
            for army in s.armies.iter_mut().filter(|a| !a.is_blessed_at(temple as u32)) {
                army.blessings.push(temple as u32);
                blessed += 1;
            }
        }
        debug!(stack = stack.0, temple, blessed, "blessing received");
        Visit {
            done: blessed > 0,
            ..trip.visit
        }
    }

    fn visit_ruin(&mut self, world: &mut World, mover: &mut dyn Mover, stack: StackId) -> Visit {
        let Some((hero, pos, owner)) = hero_of(world, stack, |_| true) else {
            return Visit::default();
        };
        let mut nearest: Option<(u32, usize)> = None;
        for (i, ruin) in world.ruins.iter().enumerate() {
            let d = ruin.pos.distance(pos);
            if ruin.searched || d > self.config.ruin_radius {
                continue;
            }
            if nearest.map_or(true, |(bd, _)| d < bd) {
                nearest = Some((d, i));
            }
        }
        let Some((_, ruin)) = nearest else {
            return Visit::default();
        };
        let dest = world.ruins[ruin].pos;
        let mut trip = travel(world, mover, stack, dest);
        let Some(party) = world.stack_with_army(hero) else {
            return trip.visit;
        };
        if !trip.arrived {
            return trip.visit;
        }

        if let Some(keeper) = world.ruins[ruin].keeper {
            let strength: u32 = world
                .stack(party)
                .map_or(0, |s| s.armies.iter().map(|a| a.effective_strength()).sum());
            if combat::resolve(strength, keeper) == FightResult::DefenderWon {
                debug!(hero = hero.0, ruin, keeper, "hero slain by ruin keeper");
                let emptied = world.stack_mut(party).map_or(false, |s| {
                    s.armies.retain(|a| a.id != hero);
                    s.is_empty()
                });
                if emptied {
                    world.remove_stack(party);
                    trip.visit.died = party == stack;
                }
                return trip.visit;
            }
        }

        let site = &mut world.ruins[ruin];
        site.searched = true;
        site.keeper = None;
        let reward = site.reward.clone();
        match reward {
            Reward::Gold(gold) => {
                if let Some(player) = world.player_mut(owner) {
                    player.gold += gold;
                }
            }
            Reward::Item(item) => {
                if let Some(army) = world
                    .stack_mut(party)
                    .and_then(|s| s.armies.iter_mut().find(|a| a.id == hero))
                {
                    army.items.push(item);
                }
            }
        }
        debug!(hero = hero.0, ruin, "ruin searched");
        Visit {
            done: true,
            ..trip.visit
        }
    }

    fn pickup_items(&mut self, world: &mut World, mover: &mut dyn Mover, stack: StackId) -> Visit {
        let Some((hero, pos, _)) = hero_of(world, stack, |_| true) else {
            return Visit::default();
        };
        let mut nearest: Option<(u32, Position)> = None;
        for (tile, items) in &world.map.loot {
            let d = tile.distance(pos);
            if items.is_empty() || d > self.config.loot_radius {
                continue;
            }
            if nearest.map_or(true, |(bd, _)| d < bd) {
                nearest = Some((d, *tile));
            }
        }
        let Some((_, dest)) = nearest else {
            return Visit::default();
        };
        let trip = travel(world, mover, stack, dest);
        let Some(party) = world.stack_with_army(hero) else {
            return trip.visit;
        };
        if !trip.arrived {
            return trip.visit;
        }
        let items = world.map.take_items(dest);
        let picked = items.len();
        if let Some(army) = world
            .stack_mut(party)
            .and_then(|s| s.armies.iter_mut().find(|a| a.id == hero))
        {
            army.items.extend(items);
        }
        debug!(hero = hero.0, picked, "items picked up");
        Visit {
            done: picked > 0,
            ..trip.visit
        }
    }
}
