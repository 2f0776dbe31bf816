use log::debug;

use crate::board::Board;
use crate::data::{TileIndex, DIRECTIONS};
use crate::heap::MinHeap;
use crate::marks::{FixedMarkSystem, MarkSystem};
use crate::moves::{Move, Moves};
use crate::state::State;

use super::{check_open, manhattan, Node, NodeArena, PathErr, PlayerAStar};

/// Result of moving a single crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CratePath {
    moves: Moves,
    player: TileIndex,
}

impl CratePath {
    /// Steps and pushes starting from the state's player position.
    pub fn moves(&self) -> &Moves {
        &self.moves
    }

    pub fn push_cnt(&self) -> usize {
        self.moves.push_cnt()
    }

    /// Where the player ends up.
    pub fn player(&self) -> TileIndex {
        self.player
    }
}

/// Moves one crate to a destination with the fewest pushes.
///
/// Other crates stay where they are and block both the crate and the player.
/// Between pushes the player walks around the crate, sides it can't reach are pruned.
/// The closed set is keyed by crate position and the side the player stands on.
#[derive(Debug)]
pub struct CrateAStar {
    open: MinHeap<usize>,
    closed: FixedMarkSystem,
    nodes: NodeArena,
    player_search: PlayerAStar,
}

impl CrateAStar {
    pub fn new(board: &Board) -> Self {
        CrateAStar {
            open: MinHeap::new(),
            closed: FixedMarkSystem::new(board.len() * DIRECTIONS.len()),
            nodes: NodeArena::default(),
            player_search: PlayerAStar::new(board),
        }
    }

    pub fn find_path(
        &mut self,
        board: &Board,
        state: &State,
        crate_pos: TileIndex,
        dest: TileIndex,
    ) -> Result<Option<CratePath>, PathErr> {
        self.search(board, state, crate_pos, dest, |_, node, _| {
            Some((Moves::default(), node.player))
        })
    }

    pub fn has_path(
        &mut self,
        board: &Board,
        state: &State,
        crate_pos: TileIndex,
        dest: TileIndex,
    ) -> Result<bool, PathErr> {
        Ok(self.find_path(board, state, crate_pos, dest)?.is_some())
    }

    /// `accept` decides whether a node with the crate on `dest` ends the search
    /// and returns the trailing walk and final player tile if it does.
    fn search<A>(
        &mut self,
        board: &Board,
        state: &State,
        crate_pos: TileIndex,
        dest: TileIndex,
        mut accept: A,
    ) -> Result<Option<CratePath>, PathErr>
    where
        A: FnMut(&mut PlayerAStar, &Node, &dyn Fn(TileIndex) -> bool) -> Option<(Moves, TileIndex)>,
    {
        check_open(board, crate_pos)?;
        check_open(board, dest)?;
        if !state.has_crate(crate_pos) {
            return Err(PathErr::NoCrate(crate_pos));
        }
        if crate_pos == dest {
            return Err(PathErr::SameTile(crate_pos));
        }

        let closed_len = board.len() * DIRECTIONS.len();
        if self.closed.len() != closed_len {
            self.closed = FixedMarkSystem::new(closed_len);
        }
        self.closed.unmark_all();
        self.open.clear();
        self.nodes.clear();

        let other_crate = |t: TileIndex| t != crate_pos && state.has_crate(t);

        let root = self.nodes.root(state.player(), Some(crate_pos));
        self.open.add(root, i64::from(manhattan(board, crate_pos, dest)));

        while let Ok((index, _)) = self.open.pop() {
            let node = *self.nodes.get(index);
            let cur_crate = node
                .crate_pos
                .expect("Crate search nodes always have a crate");

            if let Some(mov) = node.mov {
                // the player stands on the side opposite to the push
                let key = cur_crate * DIRECTIONS.len() + mov.dir as usize;
                if !self.closed.test_and_set(key) {
                    continue;
                }
            }

            let blocked = |t: TileIndex| t == cur_crate || other_crate(t);
            if cur_crate == dest {
                if let Some((tail, player)) = accept(&mut self.player_search, &node, &blocked) {
                    debug!("Crate path found with {} pushes", node.cost);
                    return self.path(board, &other_crate, index, tail, player).map(Some);
                }
                // rejected, pushing it away and back from another side might still work
            }

            for &dir in &DIRECTIONS {
                let push_from = match board.open_neighbor(cur_crate, dir.inverse()) {
                    Some(pos) => pos,
                    None => continue,
                };
                let push_to = match board.open_neighbor(cur_crate, dir) {
                    Some(pos) => pos,
                    None => continue,
                };
                if other_crate(push_to) || other_crate(push_from) {
                    continue;
                }
                let key = push_to * DIRECTIONS.len() + dir as usize;
                if self.closed.get(key) {
                    continue;
                }
                if node.player != push_from
                    && !self.player_search.has_path_avoiding(
                        board,
                        node.player,
                        push_from,
                        &blocked,
                    )?
                {
                    continue;
                }

                let cost = node.cost + 1;
                let child = self
                    .nodes
                    .child(index, cur_crate, Some(push_to), dir, true, cost);
                self.open
                    .add(child, i64::from(cost + manhattan(board, push_to, dest)));
            }
        }
        Ok(None)
    }

    /// Fills in the player's steps between pushes.
    fn path(
        &mut self,
        board: &Board,
        other_crate: &dyn Fn(TileIndex) -> bool,
        last: usize,
        tail: Moves,
        player: TileIndex,
    ) -> Result<CratePath, PathErr> {
        let chain: Vec<Node> = self.nodes.chain(last).into_iter().copied().collect();

        let mut moves = Moves::default();
        for pair in chain.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let push = next.mov.expect("Every node but the root has a move");
            let crate_before = prev.crate_pos.expect("Crate search nodes always have a crate");
            let push_from = board
                .neighbor(crate_before, push.dir.inverse())
                .expect("The player pushed from inside the board");

            if prev.player != push_from {
                let steps = self
                    .player_search
                    .find_path_avoiding(board, prev.player, push_from, |t| {
                        t == crate_before || other_crate(t)
                    })?
                    .expect("The pushing side was reachable during the search");
                moves.extend(&steps);
            }
            moves.add(Move::new(push.dir, true));
        }
        moves.extend(&tail);

        Ok(CratePath { moves, player })
    }
}

/// Like `CrateAStar` but the player must also be able to end on a given tile
/// once the crate is in place.
#[derive(Debug)]
pub struct CratePlayerAStar {
    crate_search: CrateAStar,
}

impl CratePlayerAStar {
    pub fn new(board: &Board) -> Self {
        CratePlayerAStar {
            crate_search: CrateAStar::new(board),
        }
    }

    pub fn find_path(
        &mut self,
        board: &Board,
        state: &State,
        crate_pos: TileIndex,
        crate_dest: TileIndex,
        player_dest: TileIndex,
    ) -> Result<Option<CratePath>, PathErr> {
        check_open(board, player_dest)?;
        self.crate_search
            .search(board, state, crate_pos, crate_dest, |player_search, node, blocked| {
                if node.player == player_dest {
                    return Some((Moves::default(), player_dest));
                }
                if blocked(player_dest) {
                    return None;
                }
                match player_search.find_path_avoiding(board, node.player, player_dest, blocked) {
                    Ok(Some(walk)) => Some((walk, player_dest)),
                    _ => None,
                }
            })
    }

    pub fn has_path(
        &mut self,
        board: &Board,
        state: &State,
        crate_pos: TileIndex,
        crate_dest: TileIndex,
        player_dest: TileIndex,
    ) -> Result<bool, PathErr> {
        Ok(self
            .find_path(board, state, crate_pos, crate_dest, player_dest)?
            .is_some())
    }
}
