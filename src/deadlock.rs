//! Static dead tiles and freeze deadlocks.

use std::collections::VecDeque;

use crate::board::Board;
use crate::data::{Dir, TileIndex, DIRECTIONS};
use crate::grid::Grid;
use crate::marks::{HeavyMarkSystem, MarkSystem};
use crate::state::State;

/// Tiles from which a crate can never reach any target.
///
/// Works backwards: a crate is pulled away from every target in every direction
/// where both the tile it moves to and the tile the pulling player steps to are free.
/// Other crates and player reachability are ignored.
pub(crate) fn find_dead_tiles(board: &Board) -> Grid<bool> {
    let mut marks = board.marks();
    marks.unmark_all();

    let mut to_visit = VecDeque::new();
    for &target in board.targets() {
        marks.mark(board.tile(target).mark);
        to_visit.push_back(target);
    }

    while let Some(crate_pos) = to_visit.pop_front() {
        for &dir in &DIRECTIONS {
            let pulled_to = match board.open_neighbor(crate_pos, dir) {
                Some(pos) => pos,
                None => continue,
            };
            if board.open_neighbor(pulled_to, dir).is_none() {
                // no room for the player
                continue;
            }
            let mark = board.tile(pulled_to).mark;
            if !marks.is_marked(mark) {
                marks.mark(mark);
                to_visit.push_back(pulled_to);
            }
        }
    }

    let mut dead = board.tiles().scratchpad(false);
    for i in board.tiles().indices() {
        let tile = board.tile(i);
        dead[i] = !tile.is_solid() && !marks.is_marked(tile.mark);
    }
    dead
}

/// Whether the crate at `pushed` is part of a group of crates that can never move again
/// with at least one of them off target.
///
/// A crate is frozen when it's blocked on both axes. An axis is blocked by a wall on either
/// side, by dead tiles on both sides or by a frozen crate on either side. Crates blocking
/// each other in a cycle are all frozen, so the frozen set is computed as the largest subset
/// of the pushed crate's group where every member is blocked by walls, dead tiles and other members.
pub fn is_freeze_deadlock(board: &Board, state: &State, pushed: TileIndex) -> bool {
    debug_assert!(state.has_crate(pushed));

    // cheap rejection - treat every adjacent crate as blocking
    let any_crate = |pos: TileIndex| state.has_crate(pos);
    if !(axis_blocked(board, pushed, Dir::Left, &any_crate)
        && axis_blocked(board, pushed, Dir::Up, &any_crate))
    {
        return false;
    }

    let mut marks = board.marks();
    let group = crate_group(board, state, pushed, &mut marks);

    // shrink the group until every remaining crate is blocked by the rest
    loop {
        let mut changed = false;
        for &pos in &group {
            let mark = board.tile(pos).mark;
            if !marks.is_marked(mark) {
                continue;
            }
            let in_set = |n: TileIndex| state.has_crate(n) && marks.is_marked(board.tile(n).mark);
            let frozen = axis_blocked(board, pos, Dir::Left, &in_set)
                && axis_blocked(board, pos, Dir::Up, &in_set);
            if !frozen {
                marks.unmark(mark);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    group
        .iter()
        .any(|&pos| marks.is_marked(board.tile(pos).mark) && !board.is_target(pos))
}

/// All crates connected to `start` through crates on neighboring tiles. Leaves them marked.
fn crate_group(
    board: &Board,
    state: &State,
    start: TileIndex,
    marks: &mut HeavyMarkSystem,
) -> Vec<TileIndex> {
    marks.unmark_all();
    marks.mark(board.tile(start).mark);
    let mut group = vec![start];
    let mut i = 0;
    while i < group.len() {
        let cur = group[i];
        i += 1;
        for &dir in &DIRECTIONS {
            if let Some(next) = board.open_neighbor(cur, dir) {
                let mark = board.tile(next).mark;
                if state.has_crate(next) && !marks.is_marked(mark) {
                    marks.mark(mark);
                    group.push(next);
                }
            }
        }
    }
    group
}

fn axis_blocked<F>(board: &Board, pos: TileIndex, dir: Dir, blocking_crate: &F) -> bool
where
    F: Fn(TileIndex) -> bool,
{
    match (
        board.open_neighbor(pos, dir),
        board.open_neighbor(pos, dir.inverse()),
    ) {
        (Some(a), Some(b)) => {
            (board.is_dead(a) && board.is_dead(b)) || blocking_crate(a) || blocking_crate(b)
        }
        // wall on at least one side
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use crate::board::from_xsb;

    #[test]
    fn dead_tiles() {
        let board = from_xsb(
            r"
#####
##@##
##$##
#  .#
#####
",
        );
        let mut dead_or_solid = board.tiles().scratchpad(false);
        for i in board.tiles().indices() {
            dead_or_solid[i] = board.is_solid(i) || board.is_dead(i);
        }
        let expected = r"
11111
11111
11011
11001
11111
"
        .trim_start_matches('\n');
        assert_eq!(dead_or_solid.to_string(), expected);
    }

    /// Forward search of a lone crate pushed by a player who can stand anywhere free.
    fn can_reach_target(board: &Board, start: TileIndex) -> bool {
        let mut seen = HashSet::new();
        let mut to_visit = VecDeque::new();
        seen.insert(start);
        to_visit.push_back(start);
        while let Some(pos) = to_visit.pop_front() {
            if board.is_target(pos) {
                return true;
            }
            for &dir in &DIRECTIONS {
                let player_ok = board.open_neighbor(pos, dir.inverse()).is_some();
                if let Some(next) = board.open_neighbor(pos, dir) {
                    if player_ok && seen.insert(next) {
                        to_visit.push_back(next);
                    }
                }
            }
        }
        false
    }

    #[test]
    fn dead_tiles_match_brute_force() {
        let levels = [
            r"
##########
#   #    #
# $ # .  #
#   $    #
##  ## . #
#@  #    #
##########
",
            r"
  #####
###   #
#.@$  #
### $.#
#.##$ #
# # . ##
#$ *$$.#
#   .  #
########
",
            r"
########
#  .   #
# #### #
#  $@  #
########
",
        ];
        for level in levels.iter() {
            let board = from_xsb(level);
            for i in board.tiles().indices() {
                if board.is_solid(i) {
                    assert!(!board.is_dead(i));
                    continue;
                }
                assert_eq!(
                    board.is_dead(i),
                    !can_reach_target(&board, i),
                    "tile {:?} in\n{}",
                    board.coords(i),
                    board
                );
            }
        }
    }

    fn freeze(level: &str, x: usize, y: usize) -> bool {
        let board = from_xsb(level);
        let state = board.initial_state();
        is_freeze_deadlock(&board, &state, board.index(x, y))
    }

    #[test]
    fn corner_pair_without_targets() {
        let level = r"
#######
#$$   #
#     #
#  .. #
#  @  #
#######
";
        assert!(freeze(level, 1, 1));
        assert!(freeze(level, 2, 1));
    }

    #[test]
    fn corner_pair_on_targets() {
        let level = r"
#######
#**   #
#     #
#  @  #
#######
";
        assert!(!freeze(level, 1, 1));
        assert!(!freeze(level, 2, 1));
    }

    #[test]
    fn corner_pair_one_on_target() {
        // the crate next to the corner can't move either
        let level = r"
#######
#*$   #
#     #
#  .@ #
#######
";
        assert!(freeze(level, 2, 1));
        assert!(freeze(level, 1, 1));
    }

    #[test]
    fn corner_crate_on_target_next_to_free_crate() {
        let level = r"
#######
#*    #
# $   #
#  .@ #
#######
";
        assert!(!freeze(level, 1, 1));
        assert!(!freeze(level, 2, 2));
    }

    #[test]
    fn pair_against_live_wall() {
        let level = r"
########
# .$$. #
#      #
#   @  #
########
";
        assert!(freeze(level, 3, 1));
        assert!(freeze(level, 4, 1));
    }

    #[test]
    fn frozen_on_one_axis_only() {
        // walls block it horizontally but it can still go up and down
        let level = r"
#####
##@##
## ##
##$##
## ##
##.##
#####
";
        assert!(!freeze(level, 2, 3));
    }

    #[test]
    fn square_block() {
        let level = r"
########
#      #
# $$ . #
# $$ . #
#  @ ..#
########
";
        for &(x, y) in &[(2, 2), (3, 2), (2, 3), (3, 3)] {
            assert!(freeze(level, x, y));
        }

        let on_targets = r"
########
#      #
# **   #
# **   #
#  @   #
########
";
        for &(x, y) in &[(2, 2), (3, 2), (2, 3), (3, 3)] {
            assert!(!freeze(on_targets, x, y));
        }
    }

    #[test]
    fn blocked_by_crate_that_can_move_away() {
        // the left crate is stuck only while its neighbor stays, and the neighbor can move vertically
        let level = r"
########
#.## . #
#  $$  #
#   @  #
#      #
########
";
        assert!(!freeze(level, 4, 2));
        assert!(!freeze(level, 3, 2));
    }
}
