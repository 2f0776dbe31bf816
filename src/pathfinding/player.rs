use log::trace;

use crate::board::Board;
use crate::data::{TileIndex, DIRECTIONS};
use crate::heap::MinHeap;
use crate::marks::{FixedMarkSystem, MarkSystem};
use crate::moves::Moves;
use crate::state::State;

use super::{check_open, manhattan, NodeArena, PathErr};

/// Shortest walk of the player without pushing anything.
///
/// Reusable between queries, the buffers are only cleared. Crates in the given state
/// are obstacles, the state's player position is ignored.
#[derive(Debug)]
pub struct PlayerAStar {
    open: MinHeap<usize>,
    closed: FixedMarkSystem,
    nodes: NodeArena,
}

impl PlayerAStar {
    pub fn new(board: &Board) -> Self {
        PlayerAStar {
            open: MinHeap::new(),
            closed: FixedMarkSystem::new(board.len()),
            nodes: NodeArena::default(),
        }
    }

    pub fn find_path(
        &mut self,
        board: &Board,
        state: &State,
        start: TileIndex,
        dest: TileIndex,
    ) -> Result<Option<Moves>, PathErr> {
        self.find_path_avoiding(board, start, dest, |t| state.has_crate(t))
    }

    pub fn has_path(
        &mut self,
        board: &Board,
        state: &State,
        start: TileIndex,
        dest: TileIndex,
    ) -> Result<bool, PathErr> {
        self.has_path_avoiding(board, start, dest, |t| state.has_crate(t))
    }

    pub(crate) fn find_path_avoiding<F>(
        &mut self,
        board: &Board,
        start: TileIndex,
        dest: TileIndex,
        blocked: F,
    ) -> Result<Option<Moves>, PathErr>
    where
        F: Fn(TileIndex) -> bool,
    {
        Ok(self
            .search(board, start, dest, blocked)?
            .map(|last| self.nodes.moves(last)))
    }

    pub(crate) fn has_path_avoiding<F>(
        &mut self,
        board: &Board,
        start: TileIndex,
        dest: TileIndex,
        blocked: F,
    ) -> Result<bool, PathErr>
    where
        F: Fn(TileIndex) -> bool,
    {
        Ok(self.search(board, start, dest, blocked)?.is_some())
    }

    /// Index of the node on `dest` if reachable.
    fn search<F>(
        &mut self,
        board: &Board,
        start: TileIndex,
        dest: TileIndex,
        blocked: F,
    ) -> Result<Option<usize>, PathErr>
    where
        F: Fn(TileIndex) -> bool,
    {
        check_open(board, start)?;
        check_open(board, dest)?;
        if start == dest {
            return Err(PathErr::SameTile(start));
        }

        if self.closed.len() != board.len() {
            self.closed = FixedMarkSystem::new(board.len());
        }
        self.closed.unmark_all();
        self.open.clear();
        self.nodes.clear();

        let root = self.nodes.root(start, None);
        self.open.add(root, i64::from(manhattan(board, start, dest)));

        while let Ok((index, _)) = self.open.pop() {
            let node = *self.nodes.get(index);
            if !self.closed.test_and_set(node.player) {
                continue;
            }
            if node.player == dest {
                trace!("Player path of {} moves", node.cost);
                return Ok(Some(index));
            }

            for &dir in &DIRECTIONS {
                let next = match board.open_neighbor(node.player, dir) {
                    Some(next) => next,
                    None => continue,
                };
                if blocked(next) || self.closed.get(next) {
                    continue;
                }
                let cost = node.cost + 1;
                let child = self.nodes.child(index, next, None, dir, false, cost);
                self.open
                    .add(child, i64::from(cost + manhattan(board, next, dest)));
            }
        }
        Ok(None)
    }
}
