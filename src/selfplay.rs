//! Self-play game generation.
//!
//! Plays full games on generated worlds with every faction driven by the
//! allocation engine, and records per-turn summaries for later analysis.
//! Games run in parallel on a rayon pool; each game is single-threaded.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::board::PlayerId;
use crate::config::Config;
use crate::game::{Game, TurnSummary};
use crate::scenario;

/// Configuration for self-play game generation.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    pub num_games: usize,
    /// Factions per game.
    pub players: usize,
    pub width: i32,
    pub height: i32,
    /// Number of parallel threads for concurrent games.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Suppress per-game progress logging.
    pub quiet: bool,
    /// Engine tuning; `game.turns` caps the game length.
    pub engine: Config,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            players: 4,
            width: 48,
            height: 36,
            threads: 4,
            seed: 0,
            quiet: false,
            engine: Config::default(),
        }
    }
}

/// City count of one faction at the end of a game.
#[derive(Debug, Clone, Serialize)]
pub struct Standing {
    pub player: PlayerId,
    pub name: String,
    pub cities: usize,
    pub armies: usize,
}

/// A complete self-play game record.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub game_id: usize,
    /// Seed the world was generated from.
    pub seed: u64,
    /// The only faction left holding cities, if any.
    pub winner: Option<PlayerId>,
    pub turns_played: u32,
    pub steps_walked: u64,
    pub standings: Vec<Standing>,
    pub turns: Vec<TurnSummary>,
}

/// Plays one game on a world generated from `seed`.
pub fn play_game(config: &SelfPlayConfig, game_id: usize, seed: u64) -> GameRecord {
    let world = scenario::generate(seed, config.players, config.width, config.height);
    let mut game = Game::new(world, config.engine.clone());
    let mut turns = Vec::new();
    let mut turns_played = 0;

    for _ in 0..config.engine.game.turns {
        if game.is_over() {
            break;
        }
        turns.extend(game.play_turn());
        turns_played += 1;
    }

    let world = game.world();
    let standings = world
        .players
        .iter()
        .filter(|p| !p.neutral)
        .map(|p| Standing {
            player: p.id,
            name: p.name.clone(),
            cities: world.cities_of(p.id).filter(|c| !c.burnt).count(),
            armies: world.stacks_of(p.id).map(|s| s.size()).sum(),
        })
        .collect();

    GameRecord {
        game_id,
        seed,
        winner: game.winner(),
        turns_played,
        steps_walked: game.steps_walked(),
        standings,
        turns,
    }
}

fn game_seed(config: &SelfPlayConfig, game_id: usize) -> u64 {
    if config.seed != 0 {
        config.seed.wrapping_add(game_id as u64)
    } else {
        SmallRng::from_entropy().gen()
    }
}

fn log_game(config: &SelfPlayConfig, n: usize, game: &GameRecord, started: Instant) {
    if config.quiet {
        return;
    }
    let outcome = match game.winner {
        Some(w) => format!("player {} wins", w.0),
        None => "draw".to_string(),
    };
    info!(
        game = n,
        of = config.num_games,
        turns = game.turns_played,
        secs = started.elapsed().as_secs_f64(),
        "{outcome}"
    );
}

pub fn run_self_play(config: &SelfPlayConfig) -> Vec<GameRecord> {
    let mut games = Vec::with_capacity(config.num_games);
    run_self_play_with_callback(config, |game| {
        games.push(game);
    });
    games.sort_by_key(|g| g.game_id);
    games
}

/// Plays every game and hands each record to `on_game` as it completes.
/// Records arrive in completion order when running in parallel.
pub fn run_self_play_with_callback<F>(config: &SelfPlayConfig, on_game: F)
where
    F: FnMut(GameRecord) + Send,
{
    if config.threads > 1 {
        run_self_play_parallel(config, on_game);
    } else {
        run_self_play_sequential(config, on_game);
    }
}

fn run_self_play_sequential<F>(config: &SelfPlayConfig, mut on_game: F)
where
    F: FnMut(GameRecord),
{
    for i in 0..config.num_games {
        let started = Instant::now();
        let game = play_game(config, i, game_seed(config, i));
        log_game(config, i + 1, &game, started);
        on_game(game);
    }
}

fn run_self_play_parallel<F>(config: &SelfPlayConfig, mut on_game: F)
where
    F: FnMut(GameRecord) + Send,
{
    use rayon::prelude::*;
    use std::sync::mpsc;

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
    {
        Ok(pool) => pool,
        Err(err) => {
            tracing::warn!(%err, "thread pool unavailable, playing sequentially");
            return run_self_play_sequential(config, on_game);
        }
    };

    let completed = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<GameRecord>();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            pool.install(|| {
                (0..config.num_games)
                    .into_par_iter()
                    .for_each_with(tx, |tx, i| {
                        let started = Instant::now();
                        let game = play_game(config, i, game_seed(config, i));
                        let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        log_game(config, n, &game, started);
                        let _ = tx.send(game);
                    });
            });
        });

        for game in rx {
            on_game(game);
        }
    });
}

/// Writes one JSON object per game.
pub fn write_jsonl<W: Write>(games: &[GameRecord], out: &mut W) -> std::io::Result<()> {
    for game in games {
        serde_json::to_writer(&mut *out, game)?;
        writeln!(out)?;
    }
    out.flush()
}

/// Writes win and length statistics over a batch of games.
pub fn write_summary<W: Write>(games: &[GameRecord], out: &mut W) -> std::io::Result<()> {
    let total = games.len().max(1) as f64;
    let draws = games.iter().filter(|g| g.winner.is_none()).count();
    let turns: u32 = games.iter().map(|g| g.turns_played).sum();
    let splits: usize = games
        .iter()
        .flat_map(|g| &g.turns)
        .map(|t| t.stats.splits)
        .sum();

    let mut wins: Vec<(PlayerId, usize)> = Vec::new();
    for winner in games.iter().filter_map(|g| g.winner) {
        match wins.iter_mut().find(|(p, _)| *p == winner) {
            Some((_, n)) => *n += 1,
            None => wins.push((winner, 1)),
        }
    }
    wins.sort();

    writeln!(out, "=== Self-Play Summary ===")?;
    writeln!(out, "Games: {}", games.len())?;
    writeln!(out, "Avg turns/game: {:.1}", turns as f64 / total)?;
    writeln!(out, "Avg splits/game: {:.1}", splits as f64 / total)?;
    writeln!(out, "Draws: {}", draws)?;
    writeln!(out, "Win distribution:")?;
    for (player, n) in wins {
        writeln!(out, "  player {:>2}: {} ({:.1}%)", player.0, n, 100.0 * n as f64 / total)?;
    }
    Ok(())
}
