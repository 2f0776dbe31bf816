use std::cell::{RefCell, RefMut};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};

use log::debug;

use crate::data::{Dir, TileIndex, DIRECTIONS};
use crate::deadlock;
use crate::grid::Grid;
use crate::marks::{HeavyMarkSystem, MarkSystem};
use crate::moves::Moves;
use crate::state::{State, Zobrist};
use crate::tile::{TargetRemoteness, Tile};

// distances are stored as u16
const MAX_TILES: usize = u16::max_value() as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardErr {
    NoPlayer,
    OutOfBounds(usize, usize),
    TooLarge,
    PlayerOnWall,
    CrateOnWall(usize, usize),
    TargetOnWall(usize, usize),
    PlayerOnCrate,
    DuplicateCrate(usize, usize),
    CratesTargets { crates: usize, targets: usize },
    /// Index of the first move that can't be made.
    InvalidMove(usize),
}

impl Display for BoardErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            BoardErr::NoPlayer => write!(f, "No player"),
            BoardErr::OutOfBounds(x, y) => write!(f, "Position [{}, {}] is out of bounds", x, y),
            BoardErr::TooLarge => write!(f, "Board larger than {} tiles", MAX_TILES),
            BoardErr::PlayerOnWall => write!(f, "Player stands in a wall"),
            BoardErr::CrateOnWall(x, y) => write!(f, "Crate in a wall at [{}, {}]", x, y),
            BoardErr::TargetOnWall(x, y) => write!(f, "Target in a wall at [{}, {}]", x, y),
            BoardErr::PlayerOnCrate => write!(f, "Player stands on a crate"),
            BoardErr::DuplicateCrate(x, y) => write!(f, "Two crates at [{}, {}]", x, y),
            BoardErr::CratesTargets { crates, targets } => write!(
                f,
                "Different number of crates ({}) and targets ({})",
                crates, targets
            ),
            BoardErr::InvalidMove(i) => write!(f, "Move {} can't be made", i),
        }
    }
}

impl Error for BoardErr {}

/// Collects the static layout and the initial crates and player.
#[derive(Debug, Clone)]
pub struct BoardBuilder {
    width: usize,
    height: usize,
    walls: Vec<(usize, usize)>,
    targets: Vec<(usize, usize)>,
    crates: Vec<(usize, usize)>,
    player: Option<(usize, usize)>,
}

impl BoardBuilder {
    pub fn wall(mut self, x: usize, y: usize) -> Self {
        self.walls.push((x, y));
        self
    }

    pub fn target(mut self, x: usize, y: usize) -> Self {
        self.targets.push((x, y));
        self
    }

    pub fn crate_at(mut self, x: usize, y: usize) -> Self {
        self.crates.push((x, y));
        self
    }

    pub fn player(mut self, x: usize, y: usize) -> Self {
        self.player = Some((x, y));
        self
    }

    /// Walls on every border tile.
    pub fn enclosed(mut self) -> Self {
        for x in 0..self.width {
            self.walls.push((x, 0));
            self.walls.push((x, self.height.saturating_sub(1)));
        }
        for y in 0..self.height {
            self.walls.push((0, y));
            self.walls.push((self.width.saturating_sub(1), y));
        }
        self
    }

    pub fn build(self) -> Result<Board, BoardErr> {
        if self.width == 0 || self.height == 0 || self.width * self.height > MAX_TILES {
            return Err(BoardErr::TooLarge);
        }
        let (width, height) = (self.width, self.height);
        let index = |(x, y): (usize, usize)| -> Result<TileIndex, BoardErr> {
            if x >= width || y >= height {
                Err(BoardErr::OutOfBounds(x, y))
            } else {
                Ok(y * width + x)
            }
        };

        let mut solid = Grid::new(width, height, false);
        for &pos in &self.walls {
            solid[index(pos)?] = true;
        }
        let mut target = Grid::new(width, height, false);
        let mut targets = Vec::new();
        for &pos in &self.targets {
            let i = index(pos)?;
            if solid[i] {
                return Err(BoardErr::TargetOnWall(pos.0, pos.1));
            }
            if !target[i] {
                target[i] = true;
                targets.push(i);
            }
        }
        targets.sort_unstable();

        let mut crates = Vec::with_capacity(self.crates.len());
        for &pos in &self.crates {
            let i = index(pos)?;
            if solid[i] {
                return Err(BoardErr::CrateOnWall(pos.0, pos.1));
            }
            if crates.contains(&i) {
                return Err(BoardErr::DuplicateCrate(pos.0, pos.1));
            }
            crates.push(i);
        }

        let player = index(self.player.ok_or(BoardErr::NoPlayer)?)?;
        if solid[player] {
            return Err(BoardErr::PlayerOnWall);
        }
        if crates.contains(&player) {
            return Err(BoardErr::PlayerOnCrate);
        }
        if crates.len() != targets.len() {
            return Err(BoardErr::CratesTargets {
                crates: crates.len(),
                targets: targets.len(),
            });
        }

        let mut marks = HeavyMarkSystem::new();
        let tiles = solid
            .indices()
            .map(|i| Tile::new(solid[i], target[i], marks.new_mark()))
            .collect();
        let tiles = Grid::from_vec(width, height, tiles);

        let mut board = Board {
            tiles,
            targets,
            player,
            crates,
            zobrist: Zobrist::new(width * height),
            marks: RefCell::new(marks),
        };
        board.compute_distances();
        let dead = deadlock::find_dead_tiles(&board);
        for i in board.tiles.indices() {
            board.tiles[i].dead = dead[i];
        }
        debug!("Built {}x{} board with {} crates", width, height, board.crates.len());
        Ok(board)
    }
}

/// The static part of a level plus the initial position.
///
/// Owns the mark system used by flood fills. Only one search may use a board at a time.
pub struct Board {
    tiles: Grid<Tile>,
    targets: Vec<TileIndex>,
    player: TileIndex,
    crates: Vec<TileIndex>,
    zobrist: Zobrist,
    marks: RefCell<HeavyMarkSystem>,
}

impl Board {
    pub fn builder(width: usize, height: usize) -> BoardBuilder {
        BoardBuilder {
            width,
            height,
            walls: Vec::new(),
            targets: Vec::new(),
            crates: Vec::new(),
            player: None,
        }
    }

    pub fn width(&self) -> usize {
        self.tiles.width()
    }

    pub fn height(&self) -> usize {
        self.tiles.height()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, index: TileIndex) -> &Tile {
        &self.tiles[index]
    }

    pub fn tiles(&self) -> &Grid<Tile> {
        &self.tiles
    }

    pub fn targets(&self) -> &[TileIndex] {
        &self.targets
    }

    pub fn crate_count(&self) -> usize {
        self.crates.len()
    }

    pub fn zobrist(&self) -> &Zobrist {
        &self.zobrist
    }

    pub fn index(&self, x: usize, y: usize) -> TileIndex {
        y * self.width() + x
    }

    pub fn coords(&self, index: TileIndex) -> (usize, usize) {
        (index % self.width(), index / self.width())
    }

    pub fn contains(&self, index: TileIndex) -> bool {
        index < self.len()
    }

    pub fn neighbor(&self, index: TileIndex, dir: Dir) -> Option<TileIndex> {
        let (x, y) = self.coords(index);
        let (dx, dy) = dir.offset();
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx < 0 || ny < 0 || nx >= self.width() as isize || ny >= self.height() as isize {
            None
        } else {
            Some(self.index(nx as usize, ny as usize))
        }
    }

    /// Neighbor that is inside the board and not solid.
    pub fn open_neighbor(&self, index: TileIndex, dir: Dir) -> Option<TileIndex> {
        self.neighbor(index, dir).filter(|&n| !self.tiles[n].solid)
    }

    pub fn is_solid(&self, index: TileIndex) -> bool {
        self.tiles[index].solid
    }

    pub fn is_target(&self, index: TileIndex) -> bool {
        self.tiles[index].target
    }

    pub fn is_dead(&self, index: TileIndex) -> bool {
        self.tiles[index].dead
    }

    pub fn is_crate(&self, state: &State, index: TileIndex) -> bool {
        state.has_crate(index)
    }

    pub fn is_crate_on_target(&self, state: &State, index: TileIndex) -> bool {
        self.is_target(index) && state.has_crate(index)
    }

    pub fn new_state(&self, player: TileIndex, crates: Vec<TileIndex>) -> State {
        State::new(&self.zobrist, player, crates)
    }

    pub fn initial_state(&self) -> State {
        self.new_state(self.player, self.crates.clone())
    }

    /// Every crate is on a target.
    pub fn is_solved(&self, state: &State) -> bool {
        state.crates().iter().all(|&c| self.tiles[c].target)
    }

    /// Tiles the player can walk to without pushing anything.
    ///
    /// The returned value holds the board's mark system until dropped.
    pub fn reach(&self, state: &State) -> Reach<'_> {
        let mut marks = self.marks.borrow_mut();
        marks.unmark_all();

        let start = state.player();
        marks.mark(self.tiles[start].mark);
        let mut tiles = vec![start];
        let mut i = 0;
        while i < tiles.len() {
            let cur = tiles[i];
            i += 1;
            for &dir in &DIRECTIONS {
                if let Some(next) = self.open_neighbor(cur, dir) {
                    let mark = self.tiles[next].mark;
                    if !marks.is_marked(mark) && !state.has_crate(next) {
                        marks.mark(mark);
                        tiles.push(next);
                    }
                }
            }
        }

        Reach {
            board: self,
            marks,
            tiles,
        }
    }

    pub(crate) fn marks(&self) -> RefMut<'_, HeavyMarkSystem> {
        self.marks.borrow_mut()
    }

    /// Replays `moves` from `state`, failing on the first move that walks into
    /// a wall or pushes a crate into a wall or another crate.
    pub fn apply(&self, state: &State, moves: &Moves) -> Result<State, BoardErr> {
        let mut cur = state.clone();
        for (i, mov) in moves.iter().enumerate() {
            let next = self
                .open_neighbor(cur.player(), mov.dir)
                .ok_or(BoardErr::InvalidMove(i))?;
            if cur.has_crate(next) {
                let dest = self
                    .open_neighbor(next, mov.dir)
                    .ok_or(BoardErr::InvalidMove(i))?;
                if !mov.is_push || cur.has_crate(dest) {
                    return Err(BoardErr::InvalidMove(i));
                }
                cur = cur.with_push(&self.zobrist, next, dest, next);
            } else {
                if mov.is_push {
                    return Err(BoardErr::InvalidMove(i));
                }
                cur = cur.with_player(&self.zobrist, next);
            }
        }
        Ok(cur)
    }

    pub fn format_with_state<'a>(&'a self, state: &'a State) -> StateFormatter<'a> {
        StateFormatter { board: self, state }
    }

    fn compute_distances(&mut self) {
        let mut marks = self.marks.borrow_mut();

        // one BFS per target for remoteness
        for (target_index, &target) in self.targets.iter().enumerate() {
            marks.unmark_all();
            marks.mark(self.tiles[target].mark);
            let mut to_visit = VecDeque::new();
            to_visit.push_back((target, 0u16));
            while let Some((cur, dist)) = to_visit.pop_front() {
                self.tiles[cur].remotenesses.push(TargetRemoteness {
                    target: target_index,
                    distance: dist,
                });
                for &dir in &DIRECTIONS {
                    if let Some(next) = self.neighbor(cur, dir) {
                        let tile = &self.tiles[next];
                        if !tile.solid && !marks.is_marked(tile.mark) {
                            marks.mark(tile.mark);
                            to_visit.push_back((next, dist + 1));
                        }
                    }
                }
            }
        }

        // multi-source BFS from all targets at once
        marks.unmark_all();
        let mut to_visit = VecDeque::new();
        for &target in &self.targets {
            marks.mark(self.tiles[target].mark);
            to_visit.push_back((target, 0u16));
        }
        while let Some((cur, dist)) = to_visit.pop_front() {
            self.tiles[cur].nearest_target = Some(dist);
            for &dir in &DIRECTIONS {
                if let Some(next) = self.neighbor(cur, dir) {
                    let tile = &self.tiles[next];
                    if !tile.solid && !marks.is_marked(tile.mark) {
                        marks.mark(tile.mark);
                        to_visit.push_back((next, dist + 1));
                    }
                }
            }
        }

        for tile in self.tiles.iter_mut() {
            tile.remotenesses
                .sort_by_key(|r| (r.distance, r.target));
        }
    }
}

impl Debug for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with_state(&self.initial_state()))
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with_state(&self.initial_state()))
    }
}

/// Result of a player flood fill, see `Board::reach`.
pub struct Reach<'a> {
    board: &'a Board,
    marks: RefMut<'a, HeavyMarkSystem>,
    tiles: Vec<TileIndex>,
}

impl Reach<'_> {
    pub fn contains(&self, index: TileIndex) -> bool {
        self.marks.is_marked(self.board.tiles[index].mark)
    }

    /// In discovery order, starting with the player's tile.
    pub fn tiles(&self) -> &[TileIndex] {
        &self.tiles
    }

    /// The lowest reachable index - the same for every player position in the area.
    pub fn normalized(&self) -> TileIndex {
        *self
            .tiles
            .iter()
            .min()
            .expect("The player's own tile is always reachable")
    }
}

impl Debug for Reach<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Reach {:?}", self.tiles)
    }
}

pub struct StateFormatter<'a> {
    board: &'a Board,
    state: &'a State,
}

impl Display for StateFormatter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for y in 0..self.board.height() {
            for x in 0..self.board.width() {
                let i = self.board.index(x, y);
                let tile = self.board.tile(i);
                let has_crate = self.state.has_crate(i);
                let has_player = self.state.player() == i;
                let c = match (tile.solid, tile.target, has_crate, has_player) {
                    (true, _, _, _) => '#',
                    (false, false, false, false) => ' ',
                    (false, false, true, _) => '$',
                    (false, false, false, true) => '@',
                    (false, true, false, false) => '.',
                    (false, true, true, _) => '*',
                    (false, true, false, true) => '+',
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Debug for StateFormatter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Builds a board from XSB rows, tiles past the end of a row are walls.
#[cfg(test)]
pub(crate) fn from_xsb(level: &str) -> Board {
    let level = level.trim_matches('\n');
    let rows: Vec<&str> = level.lines().collect();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap();
    let mut builder = Board::builder(width, rows.len());
    for (y, row) in rows.iter().enumerate() {
        let mut len = 0;
        for (x, c) in row.chars().enumerate() {
            len += 1;
            builder = match c {
                '#' => builder.wall(x, y),
                ' ' | '-' | '_' => builder,
                '.' => builder.target(x, y),
                '$' => builder.crate_at(x, y),
                '*' => builder.target(x, y).crate_at(x, y),
                '@' => builder.player(x, y),
                '+' => builder.target(x, y).player(x, y),
                _ => panic!("Invalid cell '{}' at [{}, {}]", c, x, y),
            };
        }
        for x in len..width {
            builder = builder.wall(x, y);
        }
    }
    builder.build().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_round_trip() {
        let level = r"
#######
#.@ # #
#$* $ #
#   $ #
# ..  #
#  *  #
#######
"
        .trim_start_matches('\n');
        let board = from_xsb(level);
        assert_eq!(board.to_string(), level);
        assert_eq!(board.crate_count(), 5);
        assert_eq!(board.targets().len(), 5);
    }

    #[test]
    fn builder_errors() {
        let b = || Board::builder(5, 5).enclosed();
        assert_eq!(b().build().unwrap_err(), BoardErr::NoPlayer);
        assert_eq!(
            b().player(5, 1).build().unwrap_err(),
            BoardErr::OutOfBounds(5, 1)
        );
        assert_eq!(b().player(0, 0).build().unwrap_err(), BoardErr::PlayerOnWall);
        assert_eq!(
            b().player(1, 1).crate_at(0, 2).build().unwrap_err(),
            BoardErr::CrateOnWall(0, 2)
        );
        assert_eq!(
            b().player(1, 1).crate_at(2, 2).target(4, 3).build().unwrap_err(),
            BoardErr::TargetOnWall(4, 3)
        );
        assert_eq!(
            b().player(1, 1).crate_at(1, 1).target(2, 2).build().unwrap_err(),
            BoardErr::PlayerOnCrate
        );
        assert_eq!(
            b().player(1, 1).crate_at(2, 2).build().unwrap_err(),
            BoardErr::CratesTargets {
                crates: 1,
                targets: 0
            }
        );
        assert_eq!(Board::builder(0, 3).build().unwrap_err(), BoardErr::TooLarge);
        assert!(b().player(1, 1).crate_at(2, 2).target(3, 3).build().is_ok());
        // the same target twice counts once
        assert!(b().player(1, 1).crate_at(2, 2).target(3, 3).target(3, 3).build().is_ok());
    }

    #[test]
    fn nearest_target_distances() {
        let board = from_xsb(
            r"
########
#.  ## #
#  $@ ##
# $   .#
########
",
        );
        let mut dists = board.tiles().scratchpad(None);
        for i in board.tiles().indices() {
            dists[i] = board.tile(i).nearest_target_distance();
        }
        let expected = r"
  -  -  -  -  -  -  -  -
  -  0  1  2  -  -  -  -
  -  1  2  3  3  2  -  -
  -  2  3  3  2  1  0  -
  -  -  -  -  -  -  -  -
"
        .trim_start_matches('\n');
        assert_eq!(dists.to_string(), expected);

        // walled off pocket
        let pocket = board.index(6, 1);
        assert_eq!(board.tile(pocket).nearest_target_distance(), None);
        assert!(board.tile(pocket).target_remotenesses().is_empty());

        let i = board.index(2, 2);
        assert_eq!(
            board.tile(i).target_remotenesses(),
            &[
                TargetRemoteness { target: 0, distance: 2 },
                TargetRemoteness { target: 1, distance: 5 },
            ]
        );
        assert_eq!(board.tile(i).distance_to(1), Some(5));
    }

    #[test]
    fn reach_stops_at_crates() {
        let board = from_xsb(
            r"
#######
#@ $  #
#  #  #
####$.#
#.    #
#######
",
        );
        let state = board.initial_state();
        let reach = board.reach(&state);
        assert!(reach.contains(board.index(2, 2)));
        assert!(!reach.contains(board.index(4, 1)));
        assert!(!reach.contains(board.index(3, 1)));
        assert_eq!(reach.tiles().len(), 4);
        assert_eq!(reach.normalized(), board.index(1, 1));
    }

    #[test]
    fn applying_moves() {
        use crate::moves::Move;

        let board = from_xsb(
            r"
######
#@$ .#
######
",
        );
        let state = board.initial_state();
        let ok = Moves::new(vec![Move::new(Dir::Right, true), Move::new(Dir::Right, true)]);
        let end = board.apply(&state, &ok).unwrap();
        assert!(board.is_solved(&end));
        assert!(board.is_crate_on_target(&end, board.index(4, 1)));

        let unmarked_push = Moves::new(vec![Move::new(Dir::Right, false)]);
        assert_eq!(
            board.apply(&state, &unmarked_push).unwrap_err(),
            BoardErr::InvalidMove(0)
        );
        let into_wall = Moves::new(vec![Move::new(Dir::Up, false)]);
        assert_eq!(
            board.apply(&state, &into_wall).unwrap_err(),
            BoardErr::InvalidMove(0)
        );
    }
}
