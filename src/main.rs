//! warband -- runs the stack allocation engine over a scenario.
//!
//! Every faction is played by the engine. One `info turn ...` line per
//! faction and turn is written to stdout; diagnostics go to stderr through
//! `tracing` (filter with `RUST_LOG`).
//!
//! Usage:
//!   warband [--scenario FILE] [--turns N] [--config FILE] [--seed N]
//!           [--players N] [--quiet]
//!
//! Without `--scenario` a world is generated from `--seed`.

use std::env;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use warband::config::Config;
use warband::game::Game;
use warband::scenario::{self, Scenario};

struct Args {
    scenario: Option<String>,
    config: Option<String>,
    turns: Option<u32>,
    seed: u64,
    players: usize,
    quiet: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        scenario: None,
        config: None,
        turns: None,
        seed: 1,
        players: 2,
        quiet: false,
    };
    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = |name: &str| it.next().ok_or_else(|| format!("{name} needs a value"));
        match arg.as_str() {
            "--scenario" => args.scenario = Some(value("--scenario")?),
            "--config" => args.config = Some(value("--config")?),
            "--turns" => {
                let v = value("--turns")?;
                args.turns = Some(v.parse().map_err(|_| format!("invalid --turns value: {v}"))?);
            }
            "--seed" => {
                let v = value("--seed")?;
                args.seed = v.parse().map_err(|_| format!("invalid --seed value: {v}"))?;
            }
            "--players" => {
                let v = value("--players")?;
                args.players = v.parse().map_err(|_| format!("invalid --players value: {v}"))?;
            }
            "--quiet" => args.quiet = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warband=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(err) => {
                error!(%err, "config rejected");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    if let Some(turns) = args.turns {
        config.game.turns = turns;
    }
    config.allocation.seed = args.seed;

    let world = match &args.scenario {
        Some(path) => match Scenario::load(path).and_then(Scenario::into_world) {
            Ok(world) => world,
            Err(err) => {
                error!(%err, path = %path, "scenario rejected");
                return ExitCode::FAILURE;
            }
        },
        None => scenario::generate(args.seed, args.players, 40, 30),
    };

    let mut game = Game::new(world, config);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match run(&mut game, &mut out, args.quiet) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "cannot write output");
            ExitCode::FAILURE
        }
    }
}

fn run<W: Write>(game: &mut Game, out: &mut W, quiet: bool) -> io::Result<()> {
    let turns = game.config().game.turns;
    let mut played = 0;
    for _ in 0..turns {
        if game.is_over() {
            break;
        }
        for summary in game.play_turn() {
            if !quiet {
                summary.write_info(out)?;
            }
        }
        played += 1;
    }
    match game.winner() {
        Some(winner) => writeln!(out, "info result winner {} turns {}", winner.0, played)?,
        None => writeln!(out, "info result draw turns {}", played)?,
    }
    out.flush()
}

fn print_usage() {
    eprintln!("Usage: warband [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario FILE  JSON scenario to play (default: generated world)");
    eprintln!("  --turns N        Turns to play (default: from config, 50)");
    eprintln!("  --config FILE    JSON config overriding the defaults");
    eprintln!("  --seed N         Seed for generation and allocation (default: 1)");
    eprintln!("  --players N      Factions in a generated world (default: 2)");
    eprintln!("  --quiet          Only print the result line");
    eprintln!("  --help           Show this help");
}
