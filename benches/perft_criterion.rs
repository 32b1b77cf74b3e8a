use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use negamax_chess::board::Board;
use negamax_chess::game_state::GameState;
use negamax_chess::move_generator::MoveGenerator;
use negamax_chess::parallel_search::ParallelSearchEngine;
use negamax_chess::search::SearchConfig;
use negamax_chess::types::{CastlingRights, Color};

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    diagram: &'static str,
    side: Color,
    rights: CastlingRights,
    expected_nodes: &'static [u64],
}

const START_DIAGRAM: &str = "
    rnbqkbnr
    pppppppp
    ........
    ........
    ........
    ........
    PPPPPPPP
    RNBQKBNR";

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "position_1",
        diagram: START_DIAGRAM,
        side: Color::White,
        rights: CastlingRights::ALL,
        expected_nodes: &[20, 400, 8902],
    },
    BenchCase {
        name: "position_2",
        diagram: "
            r...k..r
            p.ppqpb.
            bn..pnp.
            ...PN...
            .p..P...
            ..N..Q.p
            PPPBBPPP
            R...K..R",
        side: Color::White,
        rights: CastlingRights::ALL,
        expected_nodes: &[48, 2039],
    },
    BenchCase {
        name: "position_3",
        diagram: "
            ........
            ..p.....
            ...p....
            KP.....r
            .R...p.k
            ........
            ....P.P.
            ........",
        side: Color::White,
        rights: CastlingRights::NONE,
        expected_nodes: &[14, 191, 2812],
    },
];

fn load(case: &BenchCase) -> GameState {
    let board = Board::from_diagram(case.diagram).expect("bench diagram");
    GameState::from_position(board, case.side, case.rights, None).expect("bench position")
}

fn bench_perft(c: &mut Criterion) {
    let gen = MoveGenerator::new();
    let mut group = c.benchmark_group("perft");
    group.measurement_time(Duration::from_secs(5));

    for case in CASES {
        let depth = case.expected_nodes.len() as u32;
        let expected = case.expected_nodes[case.expected_nodes.len() - 1];
        let mut state = load(case);
        assert_eq!(gen.perft(&mut state, depth), expected, "{} depth {}", case.name, depth);

        group.throughput(Throughput::Elements(expected));
        group.bench_with_input(BenchmarkId::new(case.name, depth), &depth, |b, &depth| {
            b.iter(|| gen.perft(black_box(&mut state), depth))
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);
    let state = GameState::new_game();

    for threads in [1usize, 4] {
        let config = SearchConfig { depth: 3, threads, randomize_root: false, seed: None };
        let engine = ParallelSearchEngine::new(threads);
        group.bench_with_input(BenchmarkId::new("depth_3", threads), &config, |b, config| {
            b.iter(|| engine.think(black_box(&state), config))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_perft, bench_search);
criterion_main!(benches);
