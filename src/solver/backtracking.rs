use std::collections::HashMap;
use std::hash::BuildHasher;

use log::debug;

use crate::board::Board;
use crate::data::{TileIndex, DIRECTIONS};
use crate::moves::{Move, Moves};
use crate::pathfinding::PlayerAStar;
use crate::state::State;

use super::SolverErr;

// Terminology:
// move = changing player position by one tile
// push = a move that changes a crate position
// step = a move that doesn't change a crate position

/// Turns the chain of push states ending in `final_state` into player moves.
///
/// `prevs` maps every state to its predecessor, the initial state maps to itself.
/// Stored player positions may be normalized so the real position is tracked
/// from `real_initial_player` through the pushes.
pub(crate) fn reconstruct_moves<H: BuildHasher>(
    board: &Board,
    real_initial_player: TileIndex,
    prevs: &HashMap<&State, &State, H>,
    final_state: &State,
) -> Result<Moves, SolverErr> {
    let states = backtrack_prevs(prevs, final_state);
    debug!("Reconstructing moves for {} pushes", states.len() - 1);

    let mut player_search = PlayerAStar::new(board);
    let mut moves = Moves::default();
    let mut real_player = real_initial_player;
    for pair in states.windows(2) {
        let (new_moves, new_player) =
            moves_between_states(board, &mut player_search, real_player, pair[0], pair[1])?;
        moves.extend(&new_moves);
        real_player = new_player;
    }
    Ok(moves)
}

/// The difference between them must be any number of steps and one push.
fn moves_between_states(
    board: &Board,
    player_search: &mut PlayerAStar,
    old_player: TileIndex,
    old: &State,
    new: &State,
) -> Result<(Moves, TileIndex), SolverErr> {
    // both sorted, exactly one crate differs
    let old_crate = old
        .crates()
        .iter()
        .cloned()
        .find(|&c| !new.has_crate(c))
        .expect("There must be exactly one push between states");
    let new_crate = new
        .crates()
        .iter()
        .cloned()
        .find(|&c| !old.has_crate(c))
        .expect("There must be exactly one push between states");

    let push_dir = DIRECTIONS
        .iter()
        .cloned()
        .find(|&dir| board.neighbor(old_crate, dir) == Some(new_crate))
        .expect("A crate can only move to a neighboring tile");
    let push_from = board
        .neighbor(old_crate, push_dir.inverse())
        .expect("The player pushed from inside the board");

    let mut moves = if old_player == push_from {
        Moves::default()
    } else {
        player_search
            .find_path(board, old, old_player, push_from)?
            .ok_or(SolverErr::Unreachable(push_from))?
    };
    moves.add(Move::new(push_dir, true));

    Ok((moves, old_crate))
}

fn backtrack_prevs<'a, H: BuildHasher>(
    prevs: &HashMap<&'a State, &'a State, H>,
    final_state: &'a State,
) -> Vec<&'a State> {
    let mut states = Vec::new();
    let mut cur = final_state;
    loop {
        states.push(cur);
        let prev = prevs[cur];
        if prev == cur {
            states.reverse();
            return states;
        }
        cur = prev;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use fnv::FnvHashMap;

    use crate::board::from_xsb;

    #[test]
    fn backtracking() {
        // the stored player positions are normalized (or just wrong)
        // only the crates and the real initial position matter
        let board = from_xsb(
            r"
###########
# $     $.#
#        .#
##$*## #..#
#    #  ###
# @  #    #
#    #    #
## #### ###
# $   #   #
#     #   #
#         #
###########
",
        );
        let pos = |x, y| board.index(x, y);
        let state1 = board.new_state(
            pos(1, 4),
            vec![pos(2, 1), pos(8, 1), pos(2, 3), pos(3, 3), pos(2, 8)],
        );
        let state2 = board.new_state(
            pos(1, 1),
            vec![pos(2, 1), pos(8, 1), pos(2, 3), pos(3, 3), pos(2, 9)],
        );
        let state3 = board.new_state(
            pos(1, 1),
            vec![pos(1, 1), pos(8, 1), pos(2, 3), pos(3, 3), pos(2, 9)],
        );
        let state4 = board.new_state(
            pos(1, 1),
            vec![pos(1, 1), pos(9, 1), pos(2, 3), pos(3, 3), pos(2, 9)],
        );

        let mut prevs = FnvHashMap::default();
        prevs.insert(&state1, &state1);
        prevs.insert(&state2, &state1);
        prevs.insert(&state3, &state2);
        prevs.insert(&state4, &state3);

        let moves = reconstruct_moves(&board, pos(2, 5), &prevs, &state4).unwrap();
        assert_eq!(moves.push_cnt(), 3);
        // several equally short walks around the middle wall
        assert_eq!(moves.move_cnt(), 30);
        let text = moves.to_string();
        assert!(text.starts_with("ddD"));
        assert!(text.ends_with("LrrrrrR"));

        let end = board
            .apply(&board.new_state(pos(2, 5), state1.crates().to_vec()), &moves)
            .unwrap();
        assert_eq!(end.crates(), state4.crates());
    }
}
