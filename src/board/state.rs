//! Game state representation.
//!
//! `World` owns every stack in a single arena keyed by `StackId`, alongside
//! the map, cities, sites, players and quests. Everything else in the crate
//! refers to stacks by id and resolves them against this arena, so a stack
//! that died or merged simply stops resolving.

use std::collections::BTreeMap;

use super::city::{City, CityId, CITY_CAPACITY};
use super::map::Map;
use super::player::{Diplomacy, Player, PlayerId};
use super::position::Position;
use super::quest::{Quest, QuestKind, QuestStatus};
use super::site::{Ruin, Temple};
use super::unit::{Army, ArmyId, Stack, StackId, MAX_STACK_SIZE};

/// The neutral player always has this id.
pub const NEUTRAL: PlayerId = PlayerId(0);

/// Complete game state at a point in time.
#[derive(Debug, Clone)]
pub struct World {
    pub map: Map,
    pub players: Vec<Player>,
    pub stacks: BTreeMap<StackId, Stack>,
    /// Cities indexed by `CityId`.
    pub cities: Vec<City>,
    pub ruins: Vec<Ruin>,
    pub temples: Vec<Temple>,
    pub quests: Vec<Quest>,
    pub diplomacy: Diplomacy,
    pub quests_enabled: bool,
    pub turn: u32,
    next_stack: u32,
    next_army: u32,
}

impl World {
    /// Creates a world with only the neutral player.
    pub fn new(map: Map) -> Self {
        World {
            map,
            players: vec![Player::neutral(NEUTRAL)],
            stacks: BTreeMap::new(),
            cities: Vec::new(),
            ruins: Vec::new(),
            temples: Vec::new(),
            quests: Vec::new(),
            diplomacy: Diplomacy::new(false),
            quests_enabled: true,
            turn: 1,
            next_stack: 1,
            next_army: 1,
        }
    }

    // --- players -------------------------------------------------------

    pub fn add_player(&mut self, name: &str, gold: u32) -> PlayerId {
        let id = PlayerId(self.players.len() as u8);
        self.players.push(Player::new(id, name, gold));
        id
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn is_neutral(&self, id: PlayerId) -> bool {
        self.player(id).map_or(false, |p| p.neutral)
    }

    /// True when `a` and `b` fight on contact. Neutrals are hostile to all.
    pub fn is_hostile(&self, a: PlayerId, b: PlayerId) -> bool {
        a != b && (self.is_neutral(a) || self.is_neutral(b) || self.diplomacy.at_war(a, b))
    }

    /// True when `b` is another, non-neutral player `a` is at peace with.
    pub fn is_foreign(&self, a: PlayerId, b: PlayerId) -> bool {
        a != b && !self.is_hostile(a, b)
    }

    pub fn declare_war(&mut self, a: PlayerId, b: PlayerId) -> bool {
        self.diplomacy.declare_war(a, b)
    }

    /// A player is alive while it owns a city or a stack.
    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.cities.iter().any(|c| c.owner == id) || self.stacks.values().any(|s| s.owner == id)
    }

    // --- armies and stacks ---------------------------------------------

    pub fn new_army(&mut self, name: &str, strength: u32, max_moves: u32) -> Army {
        let id = ArmyId(self.next_army);
        self.next_army += 1;
        Army::new(id, name, strength, max_moves)
    }

    pub fn new_hero(&mut self, name: &str, strength: u32, max_moves: u32) -> Army {
        let id = ArmyId(self.next_army);
        self.next_army += 1;
        Army::hero(id, name, strength, max_moves)
    }

    /// Adds a stack to the arena and returns its id.
    pub fn add_stack(&mut self, owner: PlayerId, pos: Position, armies: Vec<Army>) -> StackId {
        let id = StackId(self.next_stack);
        self.next_stack += 1;
        for army in &armies {
            self.next_army = self.next_army.max(army.id.0 + 1);
        }
        self.stacks.insert(id, Stack::new(id, owner, pos, armies));
        id
    }

    pub fn stack(&self, id: StackId) -> Option<&Stack> {
        self.stacks.get(&id)
    }

    pub fn stack_mut(&mut self, id: StackId) -> Option<&mut Stack> {
        self.stacks.get_mut(&id)
    }

    pub fn remove_stack(&mut self, id: StackId) -> Option<Stack> {
        self.stacks.remove(&id)
    }

    pub fn stacks_of(&self, owner: PlayerId) -> impl Iterator<Item = &Stack> {
        self.stacks.values().filter(move |s| s.owner == owner)
    }

    /// Ids of every stack at `pos`, in id order.
    pub fn stacks_at(&self, pos: Position) -> Vec<StackId> {
        self.stacks
            .values()
            .filter(|s| s.pos == pos)
            .map(|s| s.id)
            .collect()
    }

    /// Ids of every stack within `radius` tiles of `pos`, in id order.
    pub fn stacks_within(&self, pos: Position, radius: u32) -> Vec<StackId> {
        self.stacks
            .values()
            .filter(|s| s.pos.distance(pos) <= radius)
            .map(|s| s.id)
            .collect()
    }

    /// Number of armies `owner` has on `pos`, ignoring the stack `except`.
    pub fn armies_at(&self, pos: Position, owner: PlayerId, except: Option<StackId>) -> usize {
        self.stacks
            .values()
            .filter(|s| s.pos == pos && s.owner == owner && Some(s.id) != except)
            .map(|s| s.size())
            .sum()
    }

    /// True when a stack of `size` armies of `owner` can end its move on `pos`.
    pub fn can_join(&self, pos: Position, owner: PlayerId, size: usize, except: Option<StackId>) -> bool {
        self.armies_at(pos, owner, except) + size <= MAX_STACK_SIZE
    }

    /// Returns the stack carrying the given army.
    pub fn stack_with_army(&self, army: ArmyId) -> Option<StackId> {
        self.stacks
            .values()
            .find(|s| s.contains_army(army))
            .map(|s| s.id)
    }

    /// Moves `armies` out of stack `id` into a new stack on the same tile.
    ///
    /// Returns `None` (and changes nothing) when the selection is empty,
    /// covers the whole stack or names armies the stack does not carry.
    pub fn split_stack(&mut self, id: StackId, armies: &[ArmyId]) -> Option<StackId> {
        let stack = self.stacks.get(&id)?;
        if armies.is_empty()
            || armies.len() >= stack.size()
            || !armies.iter().all(|a| stack.contains_army(*a))
        {
            return None;
        }
        let before = stack.size();
        let (owner, pos) = (stack.owner, stack.pos);

        let stack = self.stacks.get_mut(&id)?;
        let (moved, kept): (Vec<Army>, Vec<Army>) =
            stack.armies.drain(..).partition(|a| armies.contains(&a.id));
        stack.armies = kept;
        let remainder = stack.size();

        let new_id = self.add_stack(owner, pos, moved);
        let split = self.stacks[&new_id].size();
        assert_eq!(
            remainder + split,
            before,
            "split of stack {} lost armies",
            id.0
        );
        Some(new_id)
    }

    /// Moves every army of `from` into `into`. Both must share owner and tile.
    pub fn join_stacks(&mut self, into: StackId, from: StackId) {
        assert_ne!(into, from, "stack {} joined into itself", into.0);
        let donor = self
            .stacks
            .remove(&from)
            .unwrap_or_else(|| panic!("join from missing stack {}", from.0));
        let target = self
            .stacks
            .get_mut(&into)
            .unwrap_or_else(|| panic!("join into missing stack {}", into.0));
        assert_eq!(target.owner, donor.owner, "join across owners");
        assert_eq!(target.pos, donor.pos, "join across tiles");
        assert!(
            target.size() + donor.size() <= MAX_STACK_SIZE,
            "join of {} and {} exceeds stack size",
            into.0,
            from.0
        );
        target.armies.extend(donor.armies);
        target.parked = target.parked && donor.parked;
    }

    /// Merges every stack `owner` has on `pos` into the lowest-id one.
    ///
    /// Panics if the tile holds more armies than one stack may carry: the
    /// join rules guarantee that never happens.
    pub fn merge_tile(&mut self, pos: Position, owner: PlayerId) -> Option<StackId> {
        let ids: Vec<StackId> = self
            .stacks
            .values()
            .filter(|s| s.pos == pos && s.owner == owner)
            .map(|s| s.id)
            .collect();
        let (&first, rest) = ids.split_first()?;
        for &other in rest {
            self.join_stacks(first, other);
        }
        let remaining = self
            .stacks
            .values()
            .filter(|s| s.pos == pos && s.owner == owner)
            .count();
        assert_eq!(remaining, 1, "tile {:?} still holds {} stacks after merge", pos, remaining);
        Some(first)
    }

    // --- cities --------------------------------------------------------

    pub fn add_city(&mut self, name: &str, pos: Position, owner: PlayerId) -> CityId {
        let id = CityId(self.cities.len() as u32);
        self.cities.push(City::new(id, name, pos, owner));
        id
    }

    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.get(id.0 as usize)
    }

    pub fn city_mut(&mut self, id: CityId) -> Option<&mut City> {
        self.cities.get_mut(id.0 as usize)
    }

    /// The city whose footprint covers `pos`.
    pub fn city_at(&self, pos: Position) -> Option<&City> {
        self.cities.iter().find(|c| c.contains(pos))
    }

    pub fn cities_of(&self, owner: PlayerId) -> impl Iterator<Item = &City> {
        self.cities.iter().filter(move |c| c.owner == owner)
    }

    /// The nearest city to `from` accepted by `filter`; first found on ties.
    pub fn nearest_city<F>(&self, from: Position, filter: F) -> Option<CityId>
    where
        F: Fn(&City) -> bool,
    {
        let mut best: Option<(u32, CityId)> = None;
        for city in self.cities.iter().filter(|c| filter(c)) {
            let d = city.distance(from);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, city.id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Stacks standing inside the city, optionally restricted to one owner.
    pub fn stacks_in_city(&self, city: CityId, owner: Option<PlayerId>) -> Vec<StackId> {
        let Some(city) = self.city(city) else {
            return Vec::new();
        };
        self.stacks
            .values()
            .filter(|s| city.contains(s.pos) && owner.map_or(true, |o| s.owner == o))
            .map(|s| s.id)
            .collect()
    }

    /// Number of armies of `owner` inside the city.
    pub fn armies_in_city(&self, city: CityId, owner: PlayerId) -> usize {
        self.stacks_in_city(city, Some(owner))
            .iter()
            .filter_map(|id| self.stack(*id))
            .map(|s| s.size())
            .sum()
    }

    /// How many more armies of `owner` the city can take.
    pub fn free_capacity(&self, city: CityId, owner: PlayerId) -> usize {
        CITY_CAPACITY.saturating_sub(self.armies_in_city(city, owner))
    }

    /// Hands the city to a new owner and restarts its production.
    pub fn capture_city(&mut self, city: CityId, owner: PlayerId) {
        if let Some(c) = self.city_mut(city) {
            c.owner = owner;
            c.progress = 0;
        }
    }

    // --- quests --------------------------------------------------------

    pub fn quest_for(&self, hero: ArmyId) -> Option<&Quest> {
        self.quests.iter().find(|q| q.hero == hero)
    }

    /// Where the quest currently wants its hero to go.
    pub fn quest_target(&self, quest: &Quest) -> Option<Position> {
        match quest.kind {
            QuestKind::KillHero(target) => self
                .stack_with_army(target)
                .and_then(|id| self.stack(id))
                .map(|s| s.pos),
            QuestKind::CaptureCity(city) => self
                .city(city)
                .filter(|c| c.owner != quest.owner && !c.burnt)
                .map(|c| c.pos),
        }
    }

    fn quest_status(&self, quest: &Quest) -> QuestStatus {
        if self.stack_with_army(quest.hero).is_none() {
            return QuestStatus::Expired;
        }
        let done = match quest.kind {
            QuestKind::KillHero(target) => self.stack_with_army(target).is_none(),
            QuestKind::CaptureCity(city) => self.city(city).map_or(false, |c| c.owner == quest.owner),
        };
        if done {
            QuestStatus::Completed
        } else if self.turn > quest.deadline {
            QuestStatus::Expired
        } else {
            QuestStatus::Pending
        }
    }

    /// Evaluates every quest and drops the finished ones.
    pub fn update_quests(&mut self) -> Vec<(Quest, QuestStatus)> {
        let mut finished = Vec::new();
        let mut pending = Vec::new();
        for quest in std::mem::take(&mut self.quests) {
            match self.quest_status(&quest) {
                QuestStatus::Pending => pending.push(quest),
                status => finished.push((quest, status)),
            }
        }
        self.quests = pending;
        finished
    }
}
