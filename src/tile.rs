use crate::marks::Mark;

/// Walking distance from a tile to one particular target, ignoring crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRemoteness {
    /// Index into `Board::targets`.
    pub target: usize,
    pub distance: u16,
}

/// Static per-tile attributes. Crates are not stored here, they are part of `State`.
#[derive(Debug, Clone)]
pub struct Tile {
    pub(crate) solid: bool,
    pub(crate) target: bool,
    pub(crate) dead: bool,
    pub(crate) nearest_target: Option<u16>,
    // sorted by distance, then by target index
    pub(crate) remotenesses: Vec<TargetRemoteness>,
    pub(crate) mark: Mark,
}

impl Tile {
    pub(crate) fn new(solid: bool, target: bool, mark: Mark) -> Self {
        Tile {
            solid,
            target,
            dead: false,
            nearest_target: None,
            remotenesses: Vec::new(),
            mark,
        }
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }

    pub fn is_target(&self) -> bool {
        self.target
    }

    /// A crate on this tile can never be pushed onto any target.
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// `None` when no target is reachable (and always for solid tiles).
    pub fn nearest_target_distance(&self) -> Option<u16> {
        self.nearest_target
    }

    pub fn target_remotenesses(&self) -> &[TargetRemoteness] {
        &self.remotenesses
    }

    pub fn distance_to(&self, target: usize) -> Option<u16> {
        self.remotenesses
            .iter()
            .find(|r| r.target == target)
            .map(|r| r.distance)
    }
}
