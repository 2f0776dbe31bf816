//! A* searches on a fixed crate layout.
//!
//! All three share the same shape: a `MinHeap` open set ordered by cost + Manhattan distance,
//! a closed set in a `FixedMarkSystem` and nodes in a `Vec` where each node points to its parent
//! by index. The heuristic is consistent so a tile (or crate position + side) is final
//! the first time it's popped.

mod crates;
mod player;

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use crate::board::Board;
use crate::data::{Dir, TileIndex};
use crate::moves::{Move, Moves};

pub use self::crates::{CrateAStar, CratePath, CratePlayerAStar};
pub use self::player::PlayerAStar;

/// Invalid arguments to a pathfinder. A query that simply has no answer returns `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathErr {
    /// Start and destination are the same tile, there is nothing to search for.
    SameTile(TileIndex),
    OutOfBounds(TileIndex),
    SolidTile(TileIndex),
    /// Asked to move a crate that isn't there.
    NoCrate(TileIndex),
}

impl Display for PathErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            PathErr::SameTile(i) => write!(f, "Start and destination are both tile {}", i),
            PathErr::OutOfBounds(i) => write!(f, "Tile {} is out of bounds", i),
            PathErr::SolidTile(i) => write!(f, "Tile {} is solid", i),
            PathErr::NoCrate(i) => write!(f, "No crate on tile {}", i),
        }
    }
}

impl Error for PathErr {}

fn check_open(board: &Board, tile: TileIndex) -> Result<(), PathErr> {
    if !board.contains(tile) {
        Err(PathErr::OutOfBounds(tile))
    } else if board.is_solid(tile) {
        Err(PathErr::SolidTile(tile))
    } else {
        Ok(())
    }
}

pub(crate) fn manhattan(board: &Board, a: TileIndex, b: TileIndex) -> u32 {
    let (ax, ay) = board.coords(a);
    let (bx, by) = board.coords(b);
    let dx = if ax > bx { ax - bx } else { bx - ax };
    let dy = if ay > by { ay - by } else { by - ay };
    (dx + dy) as u32
}

#[derive(Debug, Clone, Copy)]
struct Node {
    player: TileIndex,
    crate_pos: Option<TileIndex>,
    parent: Option<usize>,
    // the move that led here, `None` only for the root
    mov: Option<Move>,
    cost: u32,
}

/// Nodes of one query, parents referenced by index.
#[derive(Debug, Default)]
struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    fn clear(&mut self) {
        self.nodes.clear();
    }

    fn root(&mut self, player: TileIndex, crate_pos: Option<TileIndex>) -> usize {
        self.push(Node {
            player,
            crate_pos,
            parent: None,
            mov: None,
            cost: 0,
        })
    }

    fn child(
        &mut self,
        parent: usize,
        player: TileIndex,
        crate_pos: Option<TileIndex>,
        dir: Dir,
        is_push: bool,
        cost: u32,
    ) -> usize {
        self.push(Node {
            player,
            crate_pos,
            parent: Some(parent),
            mov: Some(Move::new(dir, is_push)),
            cost,
        })
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn get(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Walks parents from `last` to the root.
    fn moves(&self, last: usize) -> Moves {
        let mut moves = Moves::default();
        let mut cur = self.get(last);
        while let (Some(mov), Some(parent)) = (cur.mov, cur.parent) {
            moves.add(mov);
            cur = self.get(parent);
        }
        moves.reverse();
        moves
    }

    /// The walk from `last` back to the root, pushes included as single moves.
    /// Used by crate searches where every node is one push preceded by some steps.
    fn chain(&self, last: usize) -> Vec<&Node> {
        let mut chain = Vec::new();
        let mut cur = Some(last);
        while let Some(index) = cur {
            let node = self.get(index);
            chain.push(node);
            cur = node.parent;
        }
        chain.reverse();
        chain
    }
}
