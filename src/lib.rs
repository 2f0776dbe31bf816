// Opt in to warnings about new 2018 idioms
#![warn(rust_2018_idioms)]
// Additional warnings that are allow by default (`rustc -W help`)
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unreachable_pub)]
#![warn(unused)]

pub mod board;
pub mod config;
pub mod data;
pub mod deadlock;
pub mod grid;
pub mod heap;
pub mod heuristic;
pub mod marks;
pub mod moves;
pub mod pathfinding;
pub mod solver;
pub mod state;
pub mod task;
pub mod tile;
pub mod tracker;

pub use crate::board::{Board, BoardBuilder, BoardErr};
pub use crate::config::{Algorithm, HeuristicKind, SolverParams};
pub use crate::moves::{Move, Moves};
pub use crate::solver::{Solution, SolveStatus, SolverErr};
pub use crate::task::{SolverTask, TaskErr};

pub trait Solve {
    /// Searches on the current thread, see `SolverTask` for running in the background.
    fn solve(&self, params: SolverParams) -> Result<Solution, SolverErr>;
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Instant;

    use separator::Separatable;

    use crate::board::from_xsb;

    const OK: i32 = 0;
    const SLOW_IN_DEBUG: i32 = 1;
    const VERY_SLOW: i32 = 2;

    #[cfg(debug_assertions)]
    const MAX_DIFFICULTY: i32 = OK;

    #[cfg(not(debug_assertions))]
    const MAX_DIFFICULTY: i32 = SLOW_IN_DEBUG;

    const ONE_WAY: &str = r"
#########
#@ $   .#
#########
";

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

    const AROUND: &str = r"
########
#@ $  .#
#  $ ###
#     .#
########
";

    // the first level of the original game
    const ORIGINAL_1: &str = r"
    #####
    #   #
    #$  #
  ###  $##
  #  $ $ #
### # ## #   ######
#   # ## #####  ..#
# $  $          ..#
##### ### #@##  ..#
    #     #########
    #######
";

    #[test]
    fn solve_levels() {
        let _ = env_logger::builder().is_test(true).try_init();

        let levels = [
            ("one way", ONE_WAY, OK),
            ("corners", CORNERS, OK),
            ("two rows", TWO_ROWS, OK),
            ("around", AROUND, SLOW_IN_DEBUG),
            ("original 1", ORIGINAL_1, VERY_SLOW),
        ];
        let levels: Vec<_> = levels
            .iter()
            .filter(|&&(_, _, difficulty)| difficulty <= MAX_DIFFICULTY)
            .collect();
        for &&(name, level, _) in &levels {
            solve_level(name, level);
        }
    }

    #[test]
    #[ignore]
    fn solve_original_1() {
        solve_level("original 1", ORIGINAL_1);

        let board = from_xsb(ORIGINAL_1);
        let bfs = board.solve(SolverParams::new(Algorithm::Bfs)).unwrap();
        let a_star = board
            .solve(SolverParams::new(Algorithm::AStar).heuristic(HeuristicKind::Greedy))
            .unwrap();
        assert!(bfs.is_solved());
        assert!(a_star.is_solved());
        assert!(a_star.stats.total_unique_visited() < bfs.stats.total_unique_visited());
    }

    /// Every algorithm must find a valid solution,
    /// BFS and A* with an admissible heuristic must agree on the number of pushes.
    fn solve_level(name: &str, level: &str) {
        let board = from_xsb(level);

        let mut optimal_pushes = None;
        for &(algorithm, heuristic) in &[
            (Algorithm::AStar, HeuristicKind::Simple),
            (Algorithm::AStar, HeuristicKind::Greedy),
            (Algorithm::BestFirst, HeuristicKind::Greedy),
            (Algorithm::Bfs, HeuristicKind::Simple),
        ] {
            let started = Instant::now();
            let solution = board
                .solve(SolverParams::new(algorithm).heuristic(heuristic))
                .unwrap();
            println!(
                "{} using {} ({}): {} states in {} ms",
                name,
                algorithm,
                heuristic,
                solution.stats.total_unique_visited().separated_string(),
                (started.elapsed().as_millis() as u64).separated_string(),
            );

            assert_eq!(solution.status, SolveStatus::Solved, "{}", name);
            let moves = solution.moves.unwrap();
            let end = board.apply(&board.initial_state(), &moves).unwrap();
            assert!(board.is_solved(&end), "{}", name);

            if heuristic == HeuristicKind::Simple {
                match optimal_pushes {
                    None => optimal_pushes = Some(moves.push_cnt()),
                    Some(pushes) => assert_eq!(moves.push_cnt(), pushes, "{}", name),
                }
            }
        }
    }

    #[test]
    fn heuristic_explores_fewer() {
        let board = from_xsb(CORNERS);
        let bfs = board.solve(SolverParams::new(Algorithm::Bfs)).unwrap();
        let a_star = board
            .solve(SolverParams::new(Algorithm::AStar).heuristic(HeuristicKind::Greedy))
            .unwrap();
        assert!(bfs.is_solved());
        assert!(a_star.is_solved());
        assert!(a_star.stats.total_unique_visited() < bfs.stats.total_unique_visited());
    }

    #[test]
    fn solution_display() {
        let board = from_xsb(ONE_WAY);
        let solution = board.solve(SolverParams::new(Algorithm::Bfs)).unwrap();
        let text = solution.to_string();
        assert!(text.starts_with("rRRRR\n\n"));
        assert!(text.contains("Depth"));
        assert!(text.contains("Explored 5 states"));

        let debug = format!("{:?}", solution);
        assert!(debug.starts_with("bfs (simple): 5 moves, 4 pushes\n"));
    }
}
