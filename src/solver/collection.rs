use std::collections::VecDeque;
use std::fmt::Debug;

use crate::heap::{MinHeap, Priority};
use crate::state::State;

use super::SearchNode;

/// The open set of a search. The order it returns nodes in is the algorithm.
pub trait SolverCollection<'a>: Debug {
    fn push(&mut self, node: SearchNode<'a>);

    fn pop(&mut self) -> Option<SearchNode<'a>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);
}

/// Breadth-first.
#[derive(Debug, Default)]
pub struct FifoCollection<'a> {
    queue: VecDeque<SearchNode<'a>>,
}

impl<'a> FifoCollection<'a> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'a> SolverCollection<'a> for FifoCollection<'a> {
    fn push(&mut self, node: SearchNode<'a>) {
        self.queue.push_back(node);
    }

    fn pop(&mut self) -> Option<SearchNode<'a>> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Depth-first.
#[derive(Debug, Default)]
pub struct StackCollection<'a> {
    stack: Vec<SearchNode<'a>>,
}

impl<'a> StackCollection<'a> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'a> SolverCollection<'a> for StackCollection<'a> {
    fn push(&mut self, node: SearchNode<'a>) {
        self.stack.push(node);
    }

    fn pop(&mut self) -> Option<SearchNode<'a>> {
        self.stack.pop()
    }

    fn len(&self) -> usize {
        self.stack.len()
    }

    fn clear(&mut self) {
        self.stack.clear();
    }
}

/// A node together with the priority it was queued with.
#[derive(Debug, Clone, Copy)]
pub struct WeightedState<'a> {
    pub node: SearchNode<'a>,
    pub weight: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    /// Pushes so far plus the heuristic (A*).
    CostPlusHeuristic,
    /// Only the heuristic (greedy best-first).
    HeuristicOnly,
}

// among nodes with the same f prefer the ones closer to the goal
const TIE_BREAK: Priority = 1 << 20;

impl Weighting {
    pub fn weight(self, node: &SearchNode<'_>) -> Priority {
        let h = Priority::from(node.h);
        match self {
            Weighting::CostPlusHeuristic => (Priority::from(node.dist) + h) * TIE_BREAK + h,
            Weighting::HeuristicOnly => h,
        }
    }
}

/// Lowest weight first. Remembers the last popped state.
#[derive(Debug)]
pub struct SolverPriorityQueue<'a> {
    heap: MinHeap<SearchNode<'a>>,
    weighting: Weighting,
    cached: Option<&'a State>,
}

impl<'a> SolverPriorityQueue<'a> {
    pub fn new(weighting: Weighting) -> Self {
        SolverPriorityQueue {
            heap: MinHeap::new(),
            weighting,
            cached: None,
        }
    }

    /// Queues with a weight chosen by the caller instead of the weighting.
    pub fn add(&mut self, weighted: WeightedState<'a>) {
        self.heap.add(weighted.node, weighted.weight);
    }

    pub fn pop_and_cache(&mut self) -> Option<WeightedState<'a>> {
        let (node, weight) = self.heap.pop().ok()?;
        self.cached = Some(node.state);
        Some(WeightedState { node, weight })
    }

    /// The state most recently returned by `pop_and_cache`.
    pub fn cached_state(&self) -> Option<&'a State> {
        self.cached
    }
}

impl<'a> SolverCollection<'a> for SolverPriorityQueue<'a> {
    fn push(&mut self, node: SearchNode<'a>) {
        let weight = self.weighting.weight(&node);
        self.add(WeightedState { node, weight });
    }

    fn pop(&mut self) -> Option<SearchNode<'a>> {
        self.pop_and_cache().map(|weighted| weighted.node)
    }

    fn len(&self) -> usize {
        self.heap.size()
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::state::Zobrist;

    fn states(zobrist: &Zobrist) -> Vec<State> {
        (0..4).map(|i| State::new(zobrist, i, vec![10 + i])).collect()
    }

    fn node(state: &State, dist: u32, h: u32) -> SearchNode<'_> {
        SearchNode {
            state,
            prev: None,
            dist,
            h,
        }
    }

    #[test]
    fn fifo_and_stack_order() {
        let zobrist = Zobrist::new(20);
        let states = states(&zobrist);

        let mut fifo = FifoCollection::new();
        let mut stack = StackCollection::new();
        for s in &states {
            fifo.push(node(s, 0, 0));
            stack.push(node(s, 0, 0));
        }
        assert_eq!(fifo.len(), 4);
        assert_eq!(fifo.pop().unwrap().state, &states[0]);
        assert_eq!(stack.pop().unwrap().state, &states[3]);
        stack.clear();
        assert!(stack.is_empty());
        assert!(stack.pop().is_none());
    }

    #[test]
    fn priority_queue_weights() {
        let zobrist = Zobrist::new(20);
        let states = states(&zobrist);

        let mut a_star = SolverPriorityQueue::new(Weighting::CostPlusHeuristic);
        a_star.push(node(&states[0], 5, 1)); // f = 6
        a_star.push(node(&states[1], 1, 4)); // f = 5, h = 4
        a_star.push(node(&states[2], 3, 2)); // f = 5, h = 2
        a_star.push(node(&states[3], 0, 7)); // f = 7
        assert_eq!(a_star.cached_state(), None);

        let order: Vec<_> = (0..4).map(|_| a_star.pop().unwrap().state).collect();
        assert_eq!(order, vec![&states[2], &states[1], &states[0], &states[3]]);
        assert_eq!(a_star.cached_state(), Some(&states[3]));
        assert!(a_star.pop().is_none());

        let mut best_first = SolverPriorityQueue::new(Weighting::HeuristicOnly);
        best_first.push(node(&states[0], 0, 3));
        best_first.push(node(&states[1], 9, 1));
        best_first.add(WeightedState {
            node: node(&states[2], 0, 9),
            weight: -1,
        });
        let first = best_first.pop_and_cache().unwrap();
        assert_eq!(first.weight, -1);
        assert_eq!(first.node.state, &states[2]);
        assert_eq!(best_first.pop().unwrap().state, &states[1]);
        assert_eq!(best_first.cached_state(), Some(&states[1]));
        assert_eq!(best_first.len(), 1);
    }
}
