//! Self-play game generation CLI.
//!
//! Plays games on generated worlds and writes one JSON record per game.
//!
//! Usage:
//!   cargo run --release --bin selfplay -- [OPTIONS]
//!
//! Options:
//!   --games N       Number of games to play (default: 10)
//!   --players N     Factions per game (default: 4)
//!   --size WxH      Map size (default: 48x36)
//!   --turns N       Turn cap per game (default: 50)
//!   --threads N     Number of parallel threads (default: 4)
//!   --seed N        Random seed, 0 for entropy (default: 0)
//!   --config FILE   JSON config overriding the engine defaults
//!   --output FILE   Output file path (default: stdout)
//!   --quiet         Suppress progress and summary output

use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::process::ExitCode;
use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use warband::config::Config;
use warband::selfplay::{self, SelfPlayConfig};

fn parse_size(v: &str) -> Option<(i32, i32)> {
    let (w, h) = v.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warband=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = SelfPlayConfig::default();
    let mut output_path: Option<String> = None;
    let mut turns: Option<u32> = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1).map(String::as_str);
        let parsed = match (flag, value) {
            ("--quiet", _) => {
                config.quiet = true;
                i += 1;
                continue;
            }
            ("--help" | "-h", _) => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            ("--games", Some(v)) => v.parse::<usize>().map(|n| config.num_games = n).is_ok(),
            ("--players", Some(v)) => v.parse::<usize>().map(|n| config.players = n).is_ok(),
            ("--threads", Some(v)) => v.parse::<usize>().map(|n| config.threads = n).is_ok(),
            ("--seed", Some(v)) => v.parse::<u64>().map(|n| config.seed = n).is_ok(),
            ("--turns", Some(v)) => v.parse::<u32>().map(|n| turns = Some(n)).is_ok(),
            ("--size", Some(v)) => parse_size(v)
                .map(|(w, h)| {
                    config.width = w;
                    config.height = h;
                })
                .is_some(),
            ("--config", Some(v)) => match Config::load(v) {
                Ok(engine) => {
                    config.engine = engine;
                    true
                }
                Err(err) => {
                    error!(%err, "config rejected");
                    return ExitCode::FAILURE;
                }
            },
            ("--output", Some(v)) => {
                output_path = Some(v.to_string());
                true
            }
            _ => false,
        };
        if !parsed {
            eprintln!("Invalid argument: {}", flag);
            print_usage();
            return ExitCode::from(2);
        }
        i += 2;
    }
    if let Some(turns) = turns {
        config.engine.game.turns = turns;
    }

    if !config.quiet {
        info!(
            games = config.num_games,
            players = config.players,
            width = config.width,
            height = config.height,
            turns = config.engine.game.turns,
            threads = config.threads,
            "self-play starting"
        );
    }

    let start = Instant::now();
    let games = selfplay::run_self_play(&config);
    let elapsed = start.elapsed();

    if !config.quiet {
        info!(
            games = games.len(),
            secs = elapsed.as_secs_f64(),
            per_hour = games.len() as f64 / elapsed.as_secs_f64().max(1e-9) * 3600.0,
            "self-play complete"
        );
        if let Err(err) = selfplay::write_summary(&games, &mut io::stderr()) {
            error!(%err, "cannot write summary");
        }
    }

    let written = match &output_path {
        Some(path) => File::create(path)
            .and_then(|file| selfplay::write_jsonl(&games, &mut BufWriter::new(file))),
        None => selfplay::write_jsonl(&games, &mut BufWriter::new(io::stdout().lock())),
    };
    match written {
        Ok(()) => {
            if let (Some(path), false) = (&output_path, config.quiet) {
                info!(games = games.len(), path = %path, "records written");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "cannot write records");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!("Usage: selfplay [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --games N        Number of games to play (default: 10)");
    eprintln!("  --players N      Factions per game (default: 4)");
    eprintln!("  --size WxH       Map size (default: 48x36)");
    eprintln!("  --turns N        Turn cap per game (default: 50)");
    eprintln!("  --threads N      Number of parallel threads (default: 4)");
    eprintln!("  --seed N         Random seed, 0 for entropy (default: 0)");
    eprintln!("  --config FILE    JSON config overriding the engine defaults");
    eprintln!("  --output FILE    Output file path (default: stdout)");
    eprintln!("  --quiet          Suppress progress and summary output");
    eprintln!("  --help           Show this help");
}
