//! Perft doubles as a performance and a correctness benchmark: a wrong leaf
//! count here means move generation regressed, not just that it got slower.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use talon::chess::movegen::perft;
use talon::chess::position::Position;

fn perft_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    let cases: Vec<(Position, u32, u64)> = vec![
        (Position::starting(), 4, 197_281),
        (
            Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap(),
            3,
            97_862,
        ),
        (
            Position::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap(),
            4,
            43_238,
        ),
    ];
    for (position, depth, nodes) in &cases {
        group.throughput(criterion::Throughput::Elements(*nodes));
        group.bench_with_input(
            BenchmarkId::new("perft", format!("{position} depth {depth}")),
            depth,
            |b, &depth| {
                b.iter(|| assert_eq!(perft(std::hint::black_box(position), depth), *nodes));
            },
        );
    }
    group.finish();
}

criterion_group! {
    name = perft_benches;
    config = Criterion::default().sample_size(10);
    targets = perft_bench
}
criterion_main!(perft_benches);
