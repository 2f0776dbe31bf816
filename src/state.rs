use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};

use crate::data::TileIndex;

const CRATE_SEED: u64 = 0x4352_4154_4500_0000;
const PLAYER_SEED: u64 = 0x504C_4159_4552_0000;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Per-tile pseudorandom keys. Crates are interchangeable so a crate key depends only
/// on the tile, the player has its own independent set of keys.
#[derive(Debug, Clone)]
pub struct Zobrist {
    crate_keys: Vec<u64>,
    player_keys: Vec<u64>,
}

impl Zobrist {
    pub fn new(tiles: usize) -> Self {
        let crate_keys = (0..tiles as u64)
            .map(|i| splitmix64(CRATE_SEED ^ i))
            .collect();
        let player_keys = (0..tiles as u64)
            .map(|i| splitmix64(PLAYER_SEED ^ i))
            .collect();
        Zobrist {
            crate_keys,
            player_keys,
        }
    }

    fn hash(&self, player: TileIndex, crates: &[TileIndex]) -> u64 {
        crates
            .iter()
            .fold(self.player_keys[player], |acc, &c| acc ^ self.crate_keys[c])
    }
}

/// Player position and crate positions.
///
/// Crates are kept sorted so states that only differ in crate order are equal
/// and iterate the same way. The hash is computed once on construction.
#[derive(Clone)]
pub struct State {
    player: TileIndex,
    crates: Box<[TileIndex]>,
    hash: u64,
}

impl State {
    pub fn new(zobrist: &Zobrist, player: TileIndex, mut crates: Vec<TileIndex>) -> State {
        crates.sort_unstable();
        let hash = zobrist.hash(player, &crates);
        State {
            player,
            crates: crates.into_boxed_slice(),
            hash,
        }
    }

    /// The state after the crate at `from` moved to `to` and the player to `player`.
    /// The hash is updated incrementally.
    pub(crate) fn with_push(
        &self,
        zobrist: &Zobrist,
        from: TileIndex,
        to: TileIndex,
        player: TileIndex,
    ) -> State {
        let mut crates = self.crates.to_vec();
        let slot = crates
            .binary_search(&from)
            .expect("Pushed crate must exist in the state");
        crates[slot] = to;
        crates.sort_unstable();

        let hash = self.hash
            ^ zobrist.player_keys[self.player]
            ^ zobrist.player_keys[player]
            ^ zobrist.crate_keys[from]
            ^ zobrist.crate_keys[to];
        State {
            player,
            crates: crates.into_boxed_slice(),
            hash,
        }
    }

    /// Same crates, different player tile.
    pub(crate) fn with_player(&self, zobrist: &Zobrist, player: TileIndex) -> State {
        State {
            player,
            crates: self.crates.clone(),
            hash: self.hash ^ zobrist.player_keys[self.player] ^ zobrist.player_keys[player],
        }
    }

    pub fn player(&self) -> TileIndex {
        self.player
    }

    pub fn crates(&self) -> &[TileIndex] {
        &self.crates
    }

    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    pub fn has_crate(&self, tile: TileIndex) -> bool {
        self.crates.binary_search(&tile).is_ok()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &State) -> bool {
        self.hash == other.hash && self.player == other.player && self.crates == other.crates
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "State {{ player: {}, crates: {:?} }}", self.player, self.crates)
    }
}
