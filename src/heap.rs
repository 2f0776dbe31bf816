use std::error::Error;
use std::fmt::{self, Display, Formatter};

pub type Priority = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapErr {
    Empty,
    Full(usize),
}

impl Display for HeapErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            HeapErr::Empty => write!(f, "Heap is empty"),
            HeapErr::Full(cap) => write!(f, "Heap is full (fixed capacity {})", cap),
        }
    }
}

impl Error for HeapErr {}

#[derive(Debug)]
struct Slot<T> {
    priority: Priority,
    item: Option<T>,
}

/// Binary min-heap - the lowest priority is popped first, equal priorities in no particular order.
///
/// Slots are never deallocated while the heap lives, popped slots are reused by later adds.
/// A fixed-capacity heap allocates all slots up front and refuses to grow.
#[derive(Debug)]
pub struct MinHeap<T> {
    slots: Vec<Slot<T>>,
    len: usize,
    fixed_capacity: Option<usize>,
}

impl<T> MinHeap<T> {
    pub fn new() -> Self {
        MinHeap {
            slots: Vec::new(),
            len: 0,
            fixed_capacity: None,
        }
    }

    pub fn with_fixed_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Slot {
                priority: 0,
                item: None,
            });
        }
        MinHeap {
            slots,
            len: 0,
            fixed_capacity: Some(capacity),
        }
    }

    pub fn size(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Panics when a fixed-capacity heap is full - size it properly.
    pub fn add(&mut self, item: T, priority: Priority) {
        if let Err(err) = self.try_add(item, priority) {
            panic!("{}", err);
        }
    }

    pub fn try_add(&mut self, item: T, priority: Priority) -> Result<(), HeapErr> {
        if self.len == self.slots.len() {
            if let Some(cap) = self.fixed_capacity {
                return Err(HeapErr::Full(cap));
            }
            self.slots.push(Slot {
                priority,
                item: Some(item),
            });
        } else {
            let slot = &mut self.slots[self.len];
            slot.priority = priority;
            slot.item = Some(item);
        }
        self.len += 1;
        self.sift_up(self.len - 1);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<(T, Priority), HeapErr> {
        if self.len == 0 {
            return Err(HeapErr::Empty);
        }
        self.len -= 1;
        self.slots.swap(0, self.len);
        let last = &mut self.slots[self.len];
        let priority = last.priority;
        let item = last
            .item
            .take()
            .expect("Every slot below len holds an item");
        self.sift_down(0);
        Ok((item, priority))
    }

    pub fn peek(&self) -> Result<(&T, Priority), HeapErr> {
        if self.len == 0 {
            return Err(HeapErr::Empty);
        }
        let root = &self.slots[0];
        let item = root.item.as_ref().expect("Every slot below len holds an item");
        Ok((item, root.priority))
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots[..self.len] {
            slot.item = None;
        }
        self.len = 0;
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.slots[i].priority >= self.slots[parent].priority {
                break;
            }
            self.slots.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let left = 2 * i + 1;
            if left >= self.len {
                return;
            }
            let right = left + 1;

            // left against the parent first, then right against whichever won
            let mut smallest = i;
            if self.slots[left].priority < self.slots[smallest].priority {
                smallest = left;
            }
            if right < self.len && self.slots[right].priority < self.slots[smallest].priority {
                smallest = right;
            }
            if smallest == i {
                return;
            }
            self.slots.swap(i, smallest);
            i = smallest;
        }
    }
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn pops_in_ascending_order() {
        let mut heap = MinHeap::new();
        for &p in &[5, 3, 8, 1, 9, 2, 7] {
            heap.add(p * 10, p);
        }
        let mut popped = Vec::new();
        while let Ok((item, priority)) = heap.pop() {
            assert_eq!(item, priority * 10);
            popped.push(priority);
        }
        assert_eq!(popped, vec![1, 2, 3, 5, 7, 8, 9]);
    }

    #[test]
    fn pop_returns_current_minimum() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut heap = MinHeap::new();
        let mut reference: Vec<Priority> = Vec::new();

        for round in 0..2000 {
            if round % 3 == 2 && !reference.is_empty() {
                let before = heap.size();
                let (_, priority) = heap.pop().unwrap();
                assert_eq!(heap.size(), before - 1);

                let min = *reference.iter().min().unwrap();
                assert_eq!(priority, min);
                let pos = reference.iter().position(|&p| p == min).unwrap();
                reference.swap_remove(pos);
            } else {
                let p: Priority = rng.gen_range(0..1000);
                let before = heap.size();
                heap.add((), p);
                assert_eq!(heap.size(), before + 1);
                reference.push(p);
            }
            assert_eq!(heap.size(), reference.len());
        }
    }

    #[test]
    fn empty_heap_is_an_error() {
        let mut heap: MinHeap<u8> = MinHeap::new();
        assert_eq!(heap.pop().unwrap_err(), HeapErr::Empty);
        assert_eq!(heap.peek().unwrap_err(), HeapErr::Empty);

        heap.add(1, 1);
        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.pop().unwrap_err(), HeapErr::Empty);
    }

    #[test]
    fn fixed_capacity_reuses_slots() {
        let mut heap = MinHeap::with_fixed_capacity(3);
        for round in 0..10 {
            heap.add("a", 3 + round);
            heap.add("b", 1 + round);
            heap.add("c", 2 + round);
            assert_eq!(heap.try_add("d", 0), Err(HeapErr::Full(3)));
            assert_eq!(heap.peek().unwrap(), (&"b", 1 + round));
            assert_eq!(heap.pop().unwrap().0, "b");
            assert_eq!(heap.pop().unwrap().0, "c");
            assert_eq!(heap.pop().unwrap().0, "a");
        }
        assert_eq!(heap.slots.len(), 3);
    }
}
