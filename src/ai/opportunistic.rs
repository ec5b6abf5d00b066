//! Quests, temples, ruins and loot.

use crate::board::ArmyId;
use crate::sites::Visit;

use super::allocation::Allocator;

impl Allocator<'_> {
    /// Advances every stack carrying a hero that is on a quest.
    pub fn continue_quests(&mut self) -> usize {
        let player = self.player;
        let heroes: Vec<ArmyId> = self
            .world
            .quests
            .iter()
            .filter(|q| q.owner == player)
            .map(|q| q.hero)
            .collect();

        let mut moved = 0;
        for hero in heroes {
            if self.cancelled() {
                break;
            }
            let Some(id) = self.world.stack_with_army(hero) else {
                continue;
            };
            if !self.available(id) {
                continue;
            }
            let visit = self.sites.continue_quest(self.world, self.mover, id);
            moved += self.settle_visit(id, visit);
        }
        moved
    }

    /// Sends hero stacks to temples for quests (when questing is on) and
    /// every other stack for blessings.
    pub fn visit_temples(&mut self, quests_enabled: bool) -> usize {
        let mut moved = 0;
        for id in self.stacks.ids() {
            if self.cancelled() {
                break;
            }
            if !self.available(id) {
                continue;
            }
            let wants_quest = quests_enabled
                && self.world.stack(id).map_or(false, |s| {
                    s.heroes().any(|h| self.world.quest_for(h.id).is_none())
                });

            let mut visit = Visit::default();
            if wants_quest {
                visit = self.sites.visit_temple_for_quest(self.world, self.mover, id);
            }
            if !visit.moved && !visit.done && !visit.died && self.world.stack(id).is_some() {
                visit = self.sites.visit_temple_for_blessing(self.world, self.mover, id);
            }
            moved += self.settle_visit(id, visit);
        }
        moved
    }

    /// Sends hero stacks to the nearest unsearched ruin.
    pub fn visit_ruins(&mut self) -> usize {
        let mut moved = 0;
        for id in self.stacks.ids() {
            if self.cancelled() {
                break;
            }
            if !self.available(id) || !self.world.stack(id).map_or(false, |s| s.has_hero()) {
                continue;
            }
            let visit = self.sites.visit_ruin(self.world, self.mover, id);
            moved += self.settle_visit(id, visit);
        }
        moved
    }

    /// Sends hero stacks to nearby loot.
    pub fn pickup_items(&mut self) -> usize {
        let mut moved = 0;
        for id in self.stacks.ids() {
            if self.cancelled() {
                break;
            }
            if !self.available(id) || !self.world.stack(id).map_or(false, |s| s.has_hero()) {
                continue;
            }
            let visit = self.sites.pickup_items(self.world, self.mover, id);
            moved += self.settle_visit(id, visit);
        }
        moved
    }
}
