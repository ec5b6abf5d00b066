//! Turn driver.
//!
//! Runs every living faction through one turn in player order: upkeep and
//! production, threat analysis, stack allocation and quest bookkeeping.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::ai::{AllocationStats, Allocator, Collaborators};
use crate::analysis::ThreatAnalysis;
use crate::board::{CityId, PlayerId, Production, QuestStatus, World};
use crate::config::Config;
use crate::movement::PathMover;
use crate::sites::SiteVisitor;

/// What one faction did in one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnSummary {
    pub turn: u32,
    pub player: PlayerId,
    pub name: String,
    pub moved: usize,
    pub threats: usize,
    pub cities: usize,
    pub stacks: usize,
    pub armies: usize,
    pub gold: u32,
    pub produced: usize,
    pub quests_completed: usize,
    pub quests_expired: usize,
    pub stats: AllocationStats,
}

impl TurnSummary {
    /// Writes the summary as a single `info turn ...` line.
    pub fn write_info<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(
            out,
            "info turn {} player {} moved {} threats {} cities {} stacks {} armies {} gold {} splits {} deaths {}",
            self.turn,
            self.name,
            self.moved,
            self.threats,
            self.cities,
            self.stacks,
            self.armies,
            self.gold,
            self.stats.splits,
            self.stats.deaths,
        )
    }
}

pub struct Game {
    world: World,
    config: Config,
    mover: PathMover,
    sites: SiteVisitor,
    stop: Arc<AtomicBool>,
}

impl Game {
    pub fn new(world: World, config: Config) -> Self {
        let sites = SiteVisitor::new(config.sites.clone());
        Game {
            world,
            config,
            mover: PathMover::new(),
            sites,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Flag that cancels allocation cooperatively when set. The faction being
    /// allocated keeps whatever was settled so far.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Path steps walked by every stack so far.
    pub fn steps_walked(&self) -> u64 {
        self.mover.steps_walked()
    }

    /// The only faction still holding cities, once every rival has lost
    /// theirs.
    pub fn winner(&self) -> Option<PlayerId> {
        let mut holders = self
            .world
            .cities
            .iter()
            .filter(|c| !c.burnt && !self.world.is_neutral(c.owner))
            .map(|c| c.owner);
        let first = holders.next()?;
        holders.all(|p| p == first).then_some(first)
    }

    /// True once a single faction holds every non-neutral city.
    pub fn is_over(&self) -> bool {
        self.winner().is_some()
    }

    /// Plays one full turn for every living faction.
    pub fn play_turn(&mut self) -> Vec<TurnSummary> {
        let players: Vec<PlayerId> = self
            .world
            .players
            .iter()
            .filter(|p| !p.neutral)
            .map(|p| p.id)
            .collect();

        let mut summaries = Vec::with_capacity(players.len());
        for player in players {
            if !self.world.is_alive(player) {
                continue;
            }
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            let summary = self.play_faction(player);
            info!(
                turn = summary.turn,
                player = player.0,
                moved = summary.moved,
                cities = summary.cities,
                armies = summary.armies,
                gold = summary.gold,
                "faction turn done"
            );
            summaries.push(summary);
        }
        self.world.turn += 1;
        summaries
    }

    fn play_faction(&mut self, player: PlayerId) -> TurnSummary {
        let produced = self.begin_turn(player);

        let analysis = ThreatAnalysis::new(player, self.config.analysis.clone());
        let threats = analysis.threats(&self.world);
        let preferred = self.capacity_target(player);
        debug!(player = player.0, threats = threats.len(), preferred = ?preferred.map(|c| c.0), "threats assessed");

        let stats = {
            let mut allocator = Allocator::new(
                &mut self.world,
                player,
                &threats,
                &self.config.allocation,
                Collaborators {
                    analysis: &analysis,
                    mover: &mut self.mover,
                    sites: &mut self.sites,
                },
            )
            .with_stop(&self.stop);
            allocator.run(preferred, self.config.game.take_neutrals);
            allocator.into_stats()
        };

        let mut quests_completed = 0;
        let mut quests_expired = 0;
        for (quest, status) in self.world.update_quests() {
            if quest.owner != player {
                continue;
            }
            match status {
                QuestStatus::Completed => quests_completed += 1,
                QuestStatus::Expired => quests_expired += 1,
                QuestStatus::Pending => {}
            }
        }

        let world = &self.world;
        TurnSummary {
            turn: world.turn,
            player,
            name: world.player(player).map(|p| p.name.clone()).unwrap_or_default(),
            moved: stats.moved,
            threats: threats.len(),
            cities: world.cities_of(player).filter(|c| !c.burnt).count(),
            stacks: world.stacks_of(player).count(),
            armies: world.stacks_of(player).map(|s| s.size()).sum(),
            gold: world.player(player).map_or(0, |p| p.gold),
            produced,
            quests_completed,
            quests_expired,
            stats,
        }
    }

    /// Refreshes the faction's stacks, settles its treasury and runs city
    /// production. Returns the number of armies produced.
    fn begin_turn(&mut self, player: PlayerId) -> usize {
        let world = &mut self.world;
        let mut armies = 0;
        for stack in world.stacks.values_mut().filter(|s| s.owner == player) {
            stack.reset_moves();
            stack.parked = false;
            stack.defending = false;
            armies += stack.size() as u32;
        }

        let income: u32 = world
            .cities_of(player)
            .filter(|c| !c.burnt)
            .map(|c| c.income)
            .sum();
        let upkeep = armies * self.config.game.army_upkeep;
        if let Some(p) = world.player_mut(player) {
            p.gold = p.gold.saturating_add(income).saturating_sub(upkeep);
        }

        let cities: Vec<CityId> = world
            .cities_of(player)
            .filter(|c| !c.burnt)
            .map(|c| c.id)
            .collect();
        cities
            .into_iter()
            .filter(|&city| self.produce(player, city))
            .count()
    }

    /// Advances a city's production and places a finished army on the first
    /// footprint tile with room. A finished army waits while the city is full.
    fn produce(&mut self, player: PlayerId, city: CityId) -> bool {
        let game = &self.config.game;
        let fallback = Production {
            strength: game.produced_strength,
            max_moves: game.produced_moves,
            turns: game.production_turns,
        };
        let Some(c) = self.world.city_mut(city) else {
            return false;
        };
        let production = c.production.unwrap_or(fallback);
        c.progress = (c.progress + 1).min(production.turns.max(1));
        if c.progress < production.turns.max(1) {
            return false;
        }

        let tiles = c.tiles();
        let Some(tile) = tiles
            .into_iter()
            .find(|t| self.world.can_join(*t, player, 1, None))
        else {
            return false;
        };
        if let Some(c) = self.world.city_mut(city) {
            c.progress = 0;
        }
        let army = self
            .world
            .new_army("Infantry", production.strength, production.max_moves);
        let id = self.world.add_stack(player, tile, vec![army]);
        self.world.merge_tile(tile, player);
        debug!(player = player.0, city = city.0, stack = id.0, "army produced");
        true
    }

    /// The neutral city nearest to the faction's first city.
    fn capacity_target(&self, player: PlayerId) -> Option<CityId> {
        let home = self.world.cities_of(player).find(|c| !c.burnt)?;
        self.world
            .nearest_city(home.pos, |c| !c.burnt && self.world.is_neutral(c.owner))
    }
}
