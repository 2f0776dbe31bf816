//! Visited-set bookkeeping that can be cleared in O(1).
//!
//! Every mark stores the generation in which it was last marked. A mark is marked
//! iff its stamp equals the system's current generation, so `unmark_all` only bumps
//! the generation. When the counter would overflow, all stamps are physically
//! cleared and counting starts over.

use std::sync::atomic::{AtomicU32, Ordering};

use log::trace;

// each system gets an id so a mark can't be used with a system that didn't issue it
static NEXT_SYSTEM_ID: AtomicU32 = AtomicU32::new(0);

// 0 is never a valid generation - fresh and reset stamps can't be marked
const UNMARKED: u32 = 0;

/// A token bound to the system that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mark {
    index: usize,
    system: u32,
}

impl Mark {
    pub fn index(self) -> usize {
        self.index
    }
}

pub trait MarkSystem {
    /// Invalidates every mark in O(1) (O(n) when the generation wraps).
    fn unmark_all(&mut self);

    /// Physically clears every stamp.
    fn reset(&mut self);

    fn mark(&mut self, mark: Mark);

    fn unmark(&mut self, mark: Mark);

    fn is_marked(&self, mark: Mark) -> bool;
}

#[derive(Debug)]
struct Generations {
    id: u32,
    current: u32,
    stamps: Vec<u32>,
}

impl Generations {
    fn new(len: usize) -> Self {
        Generations {
            id: NEXT_SYSTEM_ID.fetch_add(1, Ordering::Relaxed),
            current: UNMARKED + 1,
            stamps: vec![UNMARKED; len],
        }
    }

    fn slot(&self, mark: Mark) -> usize {
        debug_assert_eq!(mark.system, self.id, "Mark used with a foreign mark system");
        mark.index
    }

    fn next_generation(&mut self) {
        if self.current == u32::max_value() {
            trace!("Mark generation overflow, resetting {} stamps", self.stamps.len());
            self.reset();
        } else {
            self.current += 1;
        }
    }

    fn reset(&mut self) {
        for stamp in &mut self.stamps {
            *stamp = UNMARKED;
        }
        self.current = UNMARKED + 1;
    }

    fn mark(&mut self, mark: Mark) {
        let slot = self.slot(mark);
        self.stamps[slot] = self.current;
    }

    fn unmark(&mut self, mark: Mark) {
        let slot = self.slot(mark);
        self.stamps[slot] = UNMARKED;
    }

    fn is_marked(&self, mark: Mark) -> bool {
        self.stamps[self.slot(mark)] == self.current
    }
}

/// Issues marks on demand and remembers every one of them
/// so `reset` can clear marks that are still held by their owners.
#[derive(Debug)]
pub struct HeavyMarkSystem {
    generations: Generations,
}

impl HeavyMarkSystem {
    pub fn new() -> Self {
        HeavyMarkSystem {
            generations: Generations::new(0),
        }
    }

    /// A fresh, unmarked token.
    pub fn new_mark(&mut self) -> Mark {
        let index = self.generations.stamps.len();
        self.generations.stamps.push(UNMARKED);
        Mark {
            index,
            system: self.generations.id,
        }
    }

    pub fn issued(&self) -> usize {
        self.generations.stamps.len()
    }

    #[cfg(test)]
    fn with_generation(generation: u32) -> Self {
        let mut system = Self::new();
        system.generations.current = generation;
        system
    }
}

impl Default for HeavyMarkSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkSystem for HeavyMarkSystem {
    fn unmark_all(&mut self) {
        self.generations.next_generation();
    }

    fn reset(&mut self) {
        self.generations.reset();
    }

    fn mark(&mut self, mark: Mark) {
        self.generations.mark(mark);
    }

    fn unmark(&mut self, mark: Mark) {
        self.generations.unmark(mark);
    }

    fn is_marked(&self, mark: Mark) -> bool {
        self.generations.is_marked(mark)
    }
}

/// Exactly `len` marks addressed by dense index, no tokens need to be stored by the caller.
#[derive(Debug)]
pub struct FixedMarkSystem {
    generations: Generations,
}

impl FixedMarkSystem {
    pub fn new(len: usize) -> Self {
        FixedMarkSystem {
            generations: Generations::new(len),
        }
    }

    pub fn len(&self) -> usize {
        self.generations.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.stamps.is_empty()
    }

    pub fn mark_at(&self, index: usize) -> Mark {
        assert!(index < self.len(), "Mark index {} out of {}", index, self.len());
        Mark {
            index,
            system: self.generations.id,
        }
    }

    pub fn set(&mut self, index: usize) {
        let mark = self.mark_at(index);
        self.mark(mark);
    }

    pub fn get(&self, index: usize) -> bool {
        self.is_marked(self.mark_at(index))
    }

    /// Marks `index` and returns whether it was unmarked before.
    pub fn test_and_set(&mut self, index: usize) -> bool {
        if self.get(index) {
            false
        } else {
            self.set(index);
            true
        }
    }
}

impl MarkSystem for FixedMarkSystem {
    fn unmark_all(&mut self) {
        self.generations.next_generation();
    }

    fn reset(&mut self) {
        self.generations.reset();
    }

    fn mark(&mut self, mark: Mark) {
        self.generations.mark(mark);
    }

    fn unmark(&mut self, mark: Mark) {
        self.generations.unmark(mark);
    }

    fn is_marked(&self, mark: Mark) -> bool {
        self.generations.is_marked(mark)
    }
}
