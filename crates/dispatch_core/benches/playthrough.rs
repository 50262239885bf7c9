//! Playthrough benchmarks for dispatch_core.
//!
//! Run with: `cargo bench -p dispatch_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dispatch_core::prelude::*;

const CALLER: GridPos = GridPos::new(17, 13);

fn winning_replay() -> Replay {
    let mut replay = Replay::new("bench win");
    replay.record(0, PlayerCommand::AnswerCall);
    replay.record(
        0,
        PlayerCommand::Start {
            difficulty: Difficulty::Easy,
        },
    );
    for clue in 0..5u64 {
        replay.record(
            clue * 15_000,
            PlayerCommand::Dispatch {
                destination: CALLER,
            },
        );
    }
    replay.final_ms = 75_000;
    replay
}

/// Runs playthrough benchmarks for the dispatch_core crate.
pub fn playthrough_benchmark(c: &mut Criterion) {
    let replay = winning_replay();

    c.bench_function("full_win_via_scheduler", |b| {
        b.iter(|| {
            let game = replay.play(EngineConfig::default());
            black_box(game.state_hash())
        })
    });

    c.bench_function("timeout_hard_300s", |b| {
        b.iter(|| {
            let mut game = DispatchGame::default();
            game.answer_call();
            game.start_game(Difficulty::Hard);
            black_box(game.run_for(300_000))
        })
    });

    c.bench_function("view_projection", |b| {
        let mut game = DispatchGame::default();
        game.answer_call();
        game.start_game(Difficulty::Medium);
        game.begin_dispatch(CALLER);
        game.run_for(7_300);
        b.iter(|| black_box(game.view()))
    });
}

criterion_group!(benches, playthrough_benchmark);
criterion_main!(benches);
