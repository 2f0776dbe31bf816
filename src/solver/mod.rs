mod backtracking;
mod collection;
mod control;
mod stats;

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::time::Instant;

use fnv::FnvHashMap;
use log::{debug, info, trace};
use typed_arena::Arena;

use crate::board::Board;
use crate::config::{Algorithm, HeuristicKind, SolverParams};
use crate::data::{Dir, TileIndex, DIRECTIONS};
use crate::deadlock;
use crate::heuristic::Heuristic;
use crate::moves::Moves;
use crate::pathfinding::PathErr;
use crate::state::State;
use crate::tracker::{SamplingTracker, SearchProgress, SolverStatistics, Tracker};
use crate::Solve;

pub use self::collection::{
    FifoCollection, SolverCollection, SolverPriorityQueue, StackCollection, WeightedState,
    Weighting,
};
pub use self::control::{ControlState, SolverControl};
pub use self::stats::Stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverErr {
    Path(PathErr),
    /// The player couldn't walk to a tile it reached during the search.
    Unreachable(TileIndex),
}

impl Display for SolverErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            SolverErr::Path(err) => write!(f, "Pathfinding failed: {}", err),
            SolverErr::Unreachable(tile) => {
                write!(f, "Tile {} unreachable while reconstructing moves", tile)
            }
        }
    }
}

impl Error for SolverErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SolverErr::Path(err) => Some(err),
            SolverErr::Unreachable(_) => None,
        }
    }
}

impl From<PathErr> for SolverErr {
    fn from(err: PathErr) -> Self {
        SolverErr::Path(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Solved,
    /// The whole reachable state space (or `max_states` of it) was searched.
    NotSolved,
    Stopped,
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            SolveStatus::Solved => write!(f, "solved"),
            SolveStatus::NotSolved => write!(f, "not solved"),
            SolveStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// A node of the search graph. States are owned by the search's arena.
#[derive(Debug, Clone, Copy)]
pub struct SearchNode<'a> {
    pub state: &'a State,
    pub prev: Option<&'a State>,
    /// Pushes from the initial state.
    pub dist: u32,
    pub h: u32,
}

pub struct Solution {
    pub status: SolveStatus,
    /// `Some` only when solved.
    pub moves: Option<Moves>,
    pub stats: Stats,
    pub statistics: SolverStatistics,
    pub algorithm: Algorithm,
    pub heuristic: HeuristicKind,
}

impl Solution {
    pub(crate) fn new(
        outcome: Outcome,
        statistics: SolverStatistics,
        params: &SolverParams,
    ) -> Self {
        Solution {
            status: outcome.status,
            moves: outcome.moves,
            stats: outcome.stats,
            statistics,
            algorithm: params.get_algorithm(),
            heuristic: params.get_heuristic(),
        }
    }

    pub fn is_solved(&self) -> bool {
        self.status == SolveStatus::Solved
    }
}

impl Debug for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.moves {
            None => writeln!(f, "{} ({}): {}", self.algorithm, self.heuristic, self.status)?,
            Some(ref moves) => writeln!(
                f,
                "{} ({}): {} moves, {} pushes",
                self.algorithm,
                self.heuristic,
                moves.move_cnt(),
                moves.push_cnt()
            )?,
        }
        write!(f, "{:?}", self.stats)
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.moves {
            None => writeln!(f, "No solution ({})", self.status)?,
            Some(ref moves) => writeln!(f, "{}", moves)?,
        }
        writeln!(f)?;
        writeln!(f, "{}", self.stats)?;
        write!(f, "{}", self.statistics)
    }
}

impl Solve for Board {
    fn solve(&self, params: SolverParams) -> Result<Solution, SolverErr> {
        solve(self, params)
    }
}

/// Solves on the current thread. Statistics are sampled inline,
/// a timeout in the params is ignored (see `SolverTask`).
pub fn solve(board: &Board, mut params: SolverParams) -> Result<Solution, SolverErr> {
    let control = SolverControl::new();
    let progress = SearchProgress::new();
    let mut tracker = params
        .take_tracker()
        .unwrap_or_else(|| Box::new(SamplingTracker::new()));

    let outcome = search(board, &params, &control, &progress, Some(&mut *tracker))?;
    tracker.update_statistics(&progress);
    let statistics = tracker.statistics(&progress);
    Ok(Solution::new(outcome, statistics, &params))
}

pub(crate) struct Outcome {
    status: SolveStatus,
    moves: Option<Moves>,
    stats: Stats,
}

// how often the clock is checked for inline sampling
const SAMPLE_CHECK_MASK: u64 = 0xFF;

/// Everything the expansion loop needs that doesn't change during a search.
struct Searcher<'b> {
    board: &'b Board,
    params: &'b SolverParams,
    control: &'b SolverControl,
    progress: &'b SearchProgress,
    heuristic: Box<dyn Heuristic>,
    uses_heuristic: bool,
}

pub(crate) fn search(
    board: &Board,
    params: &SolverParams,
    control: &SolverControl,
    progress: &SearchProgress,
    tracker: Option<&mut dyn Tracker>,
) -> Result<Outcome, SolverErr> {
    debug!(
        "Search called: {} ({})",
        params.get_algorithm(),
        params.get_heuristic()
    );

    let searcher = Searcher {
        board,
        params,
        control,
        progress,
        heuristic: params.get_heuristic().create(),
        uses_heuristic: match params.get_algorithm() {
            Algorithm::Bfs | Algorithm::Dfs => false,
            Algorithm::AStar | Algorithm::BestFirst => true,
        },
    };
    let arena = Arena::new();

    progress.start();
    let outcome = match params.get_algorithm() {
        Algorithm::Bfs => searcher.run(&arena, FifoCollection::new(), tracker),
        Algorithm::Dfs => searcher.run(&arena, StackCollection::new(), tracker),
        Algorithm::AStar => searcher.run(
            &arena,
            SolverPriorityQueue::new(Weighting::CostPlusHeuristic),
            tracker,
        ),
        Algorithm::BestFirst => searcher.run(
            &arena,
            SolverPriorityQueue::new(Weighting::HeuristicOnly),
            tracker,
        ),
    };
    progress.finish();

    if let Ok(ref outcome) = outcome {
        info!(
            "{} ({}): {} after {} unique states",
            params.get_algorithm(),
            params.get_heuristic(),
            outcome.status,
            outcome.stats.total_unique_visited()
        );
    }
    outcome
}

/// Either the expanded states or a request to stop.
enum Expansion {
    States(Vec<State>),
    Stopped,
}

impl<'b> Searcher<'b> {
    fn run<'a, C>(
        &self,
        arena: &'a Arena<State>,
        mut to_visit: C,
        mut tracker: Option<&mut dyn Tracker>,
    ) -> Result<Outcome, SolverErr>
    where
        C: SolverCollection<'a>,
    {
        let board = self.board;
        let mut stats = Stats::new();
        let mut prevs: FnvHashMap<&'a State, &'a State> = FnvHashMap::default();
        let mut last_sample = Instant::now();
        let mut iterations: u64 = 0;

        let initial = board.initial_state();
        let normalized = board.reach(&initial).normalized();
        let start_state: &'a State = arena.alloc(initial.with_player(board.zobrist(), normalized));
        let start = SearchNode {
            state: start_state,
            prev: None,
            dist: 0,
            h: self.h(start_state),
        };
        stats.add_created(&start);
        to_visit.push(start);

        while let Some(cur) = to_visit.pop() {
            if self.control.checkpoint() {
                debug!("Stopped");
                return Ok(Outcome::new(SolveStatus::Stopped, None, stats));
            }

            iterations += 1;
            self.progress.set_queue_size(to_visit.len());
            if let Some(ref mut tracker) = tracker {
                if iterations & SAMPLE_CHECK_MASK == 0
                    && last_sample.elapsed() >= self.params.get_sample_interval()
                {
                    tracker.update_statistics(self.progress);
                    last_sample = Instant::now();
                }
            }

            if prevs.contains_key(cur.state) {
                stats.add_reached_duplicate(&cur);
                continue;
            }
            if stats.add_unique_visited(&cur) {
                trace!("Visited new depth: {}", cur.dist);
            }

            // insert here and not as soon as we discover it
            // otherwise we overwrite the shortest path with longer ones
            prevs.insert(cur.state, cur.prev.unwrap_or(cur.state));
            self.progress.set_explored(stats.total_unique_visited());

            if board.is_solved(cur.state) {
                debug!("Solved, backtracking path");
                let moves = backtracking::reconstruct_moves(
                    board,
                    initial.player(),
                    &prevs,
                    cur.state,
                )?;
                return Ok(Outcome::new(SolveStatus::Solved, Some(moves), stats));
            }

            if let Some(max) = self.params.get_max_states() {
                if prevs.len() >= max {
                    debug!("Reached the limit of {} states", max);
                    return Ok(Outcome::new(SolveStatus::NotSolved, None, stats));
                }
            }

            let neighbors = match self.expand(cur.state) {
                Expansion::States(states) => states,
                Expansion::Stopped => {
                    debug!("Stopped during expansion");
                    return Ok(Outcome::new(SolveStatus::Stopped, None, stats));
                }
            };
            for neighbor_state in neighbors {
                if prevs.contains_key(&neighbor_state) {
                    continue;
                }
                let neighbor_state: &'a State = arena.alloc(neighbor_state);
                let next = SearchNode {
                    state: neighbor_state,
                    prev: Some(cur.state),
                    dist: cur.dist + 1,
                    h: self.h(neighbor_state),
                };
                stats.add_created(&next);
                to_visit.push(next);
            }
        }

        debug!("Searched everything, no solution");
        Ok(Outcome::new(SolveStatus::NotSolved, None, stats))
    }

    fn h(&self, state: &State) -> u32 {
        if self.uses_heuristic {
            self.heuristic.compute(self.board, state)
        } else {
            0
        }
    }

    /// All states one push away.
    ///
    /// A push is possible when the player can walk to the side opposite to the push
    /// and the tile behind the crate is free. Pushes onto dead tiles and
    /// pushes that freeze crates off target are left out. Player positions are normalized.
    fn expand(&self, state: &State) -> Expansion {
        let board = self.board;

        let pushes: Vec<(TileIndex, Dir)> = {
            let reach = board.reach(state);
            let mut pushes = Vec::new();
            for &crate_pos in state.crates() {
                for &dir in &DIRECTIONS {
                    let push_from = match board.neighbor(crate_pos, dir.inverse()) {
                        Some(tile) => tile,
                        None => continue,
                    };
                    if reach.contains(push_from) {
                        pushes.push((crate_pos, dir));
                    }
                }
            }
            pushes
        };

        let mut new_states = Vec::with_capacity(pushes.len());
        for (crate_pos, dir) in pushes {
            if self.control.checkpoint() {
                return Expansion::Stopped;
            }

            let push_to = match board.open_neighbor(crate_pos, dir) {
                Some(tile) => tile,
                None => continue,
            };
            if state.has_crate(push_to) || board.is_dead(push_to) {
                continue;
            }

            let pushed = state.with_push(board.zobrist(), crate_pos, push_to, crate_pos);
            if deadlock::is_freeze_deadlock(board, &pushed, push_to) {
                continue;
            }
            let normalized = board.reach(&pushed).normalized();
            new_states.push(pushed.with_player(board.zobrist(), normalized));
        }
        Expansion::States(new_states)
    }
}

impl Outcome {
    fn new(status: SolveStatus, moves: Option<Moves>, stats: Stats) -> Self {
        Outcome {
            status,
            moves,
            stats,
        }
    }
}
