//! The per-turn pool of stacks still available for assignment.
//!
//! Holds ids only. Insertion order is kept so that every "first found" tie
//! break is reproducible, and a reverse index makes removal by id cheap.

use std::collections::{BTreeMap, HashMap};

use crate::board::{PlayerId, StackId, World};

#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    order: BTreeMap<u64, StackId>,
    index: HashMap<StackId, u64>,
    next_seq: u64,
}

impl WorkingSet {
    pub fn new() -> Self {
        WorkingSet::default()
    }

    /// Builds the set from every live stack of `owner`, in id order.
    pub fn from_roster(world: &World, owner: PlayerId, skip_parked: bool) -> Self {
        let mut set = WorkingSet::new();
        for stack in world.stacks_of(owner) {
            if skip_parked && stack.parked {
                continue;
            }
            set.add(stack.id);
        }
        set
    }

    /// Inserts `id` at the end. Returns false if it was already present.
    pub fn add(&mut self, id: StackId) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, id);
        self.index.insert(id, seq);
        true
    }

    /// Removes `id`. Returns whether it was present.
    pub fn remove(&mut self, id: StackId) -> bool {
        match self.index.remove(&id) {
            Some(seq) => {
                self.order.remove(&seq);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: StackId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Snapshot of the members in insertion order.
    ///
    /// Phases iterate over a snapshot and re-check membership, so they can
    /// remove and insert freely while walking it.
    pub fn ids(&self) -> Vec<StackId> {
        self.order.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = StackId> + '_ {
        self.order.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Map, Position, Terrain};

    #[test]
    fn add_is_deduplicated() {
        let mut set = WorkingSet::new();
        assert!(set.add(StackId(4)));
        assert!(!set.add(StackId(4)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut set = WorkingSet::new();
        set.add(StackId(1));
        assert!(!set.remove(StackId(2)));
        assert!(set.remove(StackId(1)));
        assert!(!set.remove(StackId(1)));
        assert!(set.is_empty());
    }

    #[test]
    fn keeps_insertion_order() {
        let mut set = WorkingSet::new();
        for id in [7, 2, 9] {
            set.add(StackId(id));
        }
        set.remove(StackId(2));
        set.add(StackId(2));
        assert_eq!(set.ids(), vec![StackId(7), StackId(9), StackId(2)]);
    }

    #[test]
    fn roster_can_skip_parked() {
        let mut w = World::new(Map::filled(4, 4, Terrain::Grass));
        let me = w.add_player("Sirians", 0);
        let a = w.new_army("Infantry", 2, 10);
        let b = w.new_army("Infantry", 2, 10);
        let s1 = w.add_stack(me, Position::new(0, 0), vec![a]);
        let s2 = w.add_stack(me, Position::new(1, 0), vec![b]);
        w.stack_mut(s2).unwrap().parked = true;

        assert_eq!(WorkingSet::from_roster(&w, me, false).len(), 2);
        let set = WorkingSet::from_roster(&w, me, true);
        assert!(set.contains(s1));
        assert!(!set.contains(s2));
    }
}
