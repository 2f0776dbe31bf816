//! Estimates of the pushes left, less is better.

use std::fmt::Debug;

use crate::board::Board;
use crate::config::HeuristicKind;
use crate::heap::{MinHeap, Priority};
use crate::state::State;

// crates on tiles with no reachable target make the state unsolvable,
// it should never get here because those tiles are dead
const UNREACHABLE: u32 = u16::max_value() as u32;

pub trait Heuristic: Debug + Send {
    fn compute(&self, board: &Board, state: &State) -> u32;
}

impl HeuristicKind {
    pub fn create(self) -> Box<dyn Heuristic> {
        match self {
            HeuristicKind::Simple => Box::new(SimpleHeuristic),
            HeuristicKind::Greedy => Box::new(GreedyHeuristic),
        }
    }
}

fn nearest(board: &Board, tile: usize) -> u32 {
    board
        .tile(tile)
        .nearest_target_distance()
        .map_or(UNREACHABLE, u32::from)
}

/// Every crate goes to its nearest target, even if others go there too.
/// Never overestimates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleHeuristic;

impl Heuristic for SimpleHeuristic {
    fn compute(&self, board: &Board, state: &State) -> u32 {
        state.crates().iter().map(|&c| nearest(board, c)).sum()
    }
}

/// Assigns crates to targets cheapest pair first, each target at most once.
///
/// Not a minimum matching so it can overestimate. Crates already on a target
/// are left out, their targets are still offered to the other crates.
/// Equal distances go to the lower crate index, then the lower target index.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyHeuristic;

impl Heuristic for GreedyHeuristic {
    fn compute(&self, board: &Board, state: &State) -> u32 {
        let targets = board.targets();
        let crates: Vec<_> = state
            .crates()
            .iter()
            .cloned()
            .filter(|&c| !board.is_target(c))
            .collect();
        if crates.is_empty() {
            return 0;
        }

        let target_cnt = targets.len() as Priority;
        let crate_cnt = crates.len() as Priority;
        let mut target_taken = vec![false; targets.len()];
        let mut crate_taken = vec![false; crates.len()];

        let mut pairs = MinHeap::new();
        for (ci, &c) in crates.iter().enumerate() {
            for remoteness in board.tile(c).target_remotenesses() {
                if target_taken[remoteness.target] {
                    continue;
                }
                let dist = Priority::from(remoteness.distance);
                let priority = (dist * crate_cnt + ci as Priority) * target_cnt
                    + remoteness.target as Priority;
                pairs.add((ci, remoteness.target, remoteness.distance), priority);
            }
        }

        let mut sum = 0;
        while let Ok(((ci, ti, dist), _)) = pairs.pop() {
            if crate_taken[ci] || target_taken[ti] {
                continue;
            }
            crate_taken[ci] = true;
            target_taken[ti] = true;
            sum += u32::from(dist);
        }

        for (ci, &c) in crates.iter().enumerate() {
            if !crate_taken[ci] {
                sum += nearest(board, c);
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::board::from_xsb;

    #[test]
    fn shared_nearest_target() {
        let board = from_xsb(
            r"
##########
#.   $$ .#
#  @     #
##########
",
        );
        let state = board.initial_state();
        assert_eq!(SimpleHeuristic.compute(&board, &state), 5);
        assert_eq!(GreedyHeuristic.compute(&board, &state), 6);
    }

    #[test]
    fn occupied_targets_stay_available() {
        let board = from_xsb(
            r"
########
#*$   .#
#   @  #
########
",
        );
        let state = board.initial_state();
        // the crate on the target doesn't claim it
        assert_eq!(SimpleHeuristic.compute(&board, &state), 1);
        assert_eq!(GreedyHeuristic.compute(&board, &state), 1);
    }

    #[test]
    fn solved_is_zero() {
        let board = from_xsb(
            r"
######
#@**.#
#   $#
######
",
        );
        let solved = board.new_state(board.index(1, 1), vec![
            board.index(2, 1),
            board.index(3, 1),
            board.index(4, 1),
        ]);
        for kind in &[HeuristicKind::Simple, HeuristicKind::Greedy] {
            let heuristic = kind.create();
            assert_eq!(heuristic.compute(&board, &solved), 0);
            assert!(heuristic.compute(&board, &board.initial_state()) > 0);
        }
    }
}
