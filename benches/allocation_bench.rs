use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use warband::ai::{AllocationConfig, Allocator, Collaborators};
use warband::analysis::{AnalysisConfig, ThreatAnalysis};
use warband::board::{PlayerId, Position, World};
use warband::config::Config;
use warband::game::Game;
use warband::movement::path::find_path;
use warband::movement::PathMover;
use warband::scenario::generate;
use warband::sites::SiteVisitor;

const SEED: u64 = 17;
const FIRST: PlayerId = PlayerId(1);

fn world() -> World {
    generate(SEED, 4, 48, 36)
}

fn bench_threats(c: &mut Criterion) {
    let world = world();
    let analysis = ThreatAnalysis::new(FIRST, AnalysisConfig::default());
    c.bench_function("threats_4_players_48x36", |b| {
        b.iter(|| analysis.threats(black_box(&world)))
    });
}

fn bench_allocation_run(c: &mut Criterion) {
    let world = world();
    let config = AllocationConfig::default();
    let analysis = ThreatAnalysis::new(FIRST, AnalysisConfig::default());
    let threats = analysis.threats(&world);

    c.bench_function("allocation_run_first_turn", |b| {
        b.iter_batched(
            || world.clone(),
            |mut scratch| {
                let mut mover = PathMover::new();
                let mut sites = SiteVisitor::default();
                let mut alloc = Allocator::new(
                    &mut scratch,
                    FIRST,
                    &threats,
                    &config,
                    Collaborators {
                        analysis: &analysis,
                        mover: &mut mover,
                        sites: &mut sites,
                    },
                );
                alloc.run(None, true)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_path(c: &mut Criterion) {
    let world = world();
    let Some(stack) = world.stacks_of(FIRST).next() else {
        return;
    };
    let dest = Position::new(world.map.width() - 2, world.map.height() - 2);
    c.bench_function("find_path_across_map", |b| {
        b.iter(|| find_path(black_box(&world), black_box(stack), dest))
    });
}

fn bench_full_turn(c: &mut Criterion) {
    let world = world();
    c.bench_function("play_turn_4_players", |b| {
        b.iter_batched(
            || Game::new(world.clone(), Config::default()),
            |mut game| game.play_turn(),
            BatchSize::SmallInput,
        )
    });
}

fn bench_world_clone(c: &mut Criterion) {
    let world = world();
    c.bench_function("world_clone", |b| b.iter(|| black_box(&world).clone()));
}

criterion_group!(
    benches,
    bench_threats,
    bench_allocation_run,
    bench_find_path,
    bench_full_turn,
    bench_world_clone,
);
criterion_main!(benches);
