use criterion::{criterion_group, criterion_main, Criterion};

use sokoban_engine::{Algorithm, Board, HeuristicKind, Solve, SolverParams};

const CORNERS: &str = r"
#########
#   #   #
# $   $ #
#.# # #.#
#   @   #
#########
";

const TWO_ROWS: &str = r"
##########
#@       #
# $ $ .. #
#        #
##########
";

fn parse(level: &str) -> Board {
    let rows: Vec<&str> = level.trim_matches('\n').lines().collect();
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
    let mut builder = Board::builder(width, rows.len());
    for (y, row) in rows.iter().enumerate() {
        for (x, c) in row.chars().enumerate() {
            builder = match c {
                '#' => builder.wall(x, y),
                '.' => builder.target(x, y),
                '$' => builder.crate_at(x, y),
                '*' => builder.target(x, y).crate_at(x, y),
                '@' => builder.player(x, y),
                '+' => builder.target(x, y).player(x, y),
                _ => builder,
            };
        }
    }
    builder.build().unwrap()
}

fn bench_level(c: &mut Criterion, name: &str, level: &str, samples: usize) {
    let board = parse(level);
    let mut group = c.benchmark_group(name);
    group.sample_size(samples);
    for &(algorithm, heuristic) in &[
        (Algorithm::Bfs, HeuristicKind::Simple),
        (Algorithm::AStar, HeuristicKind::Simple),
        (Algorithm::AStar, HeuristicKind::Greedy),
        (Algorithm::BestFirst, HeuristicKind::Greedy),
    ] {
        group.bench_function(format!("{} ({})", algorithm, heuristic), |b| {
            b.iter(|| {
                criterion::black_box(
                    board.solve(SolverParams::new(algorithm).heuristic(heuristic)),
                )
            })
        });
    }
    group.finish();
}

// allowing unused so i can bench just one
// and still notice other warnings if there are any
#[allow(unused)]
fn bench_corners(c: &mut Criterion) {
    // two crates, one target each side
    bench_level(c, "corners", CORNERS, 100);
}

#[allow(unused)]
fn bench_two_rows(c: &mut Criterion) {
    bench_level(c, "two rows", TWO_ROWS, 50);
}

criterion_group!(benches, bench_corners, bench_two_rows);
criterion_main!(benches);
