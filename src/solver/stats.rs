use std::fmt::{self, Debug, Display, Formatter};

use separator::Separatable;

use super::SearchNode;

/// Per-depth counters, depth is the number of pushes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Stats {
    created_states: Vec<u64>,
    visited_states: Vec<u64>,
    duplicate_states: Vec<u64>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_created(&self) -> u64 {
        self.created_states.iter().sum()
    }

    pub fn total_unique_visited(&self) -> u64 {
        self.visited_states.iter().sum()
    }

    pub fn total_reached_duplicates(&self) -> u64 {
        self.duplicate_states.iter().sum()
    }

    /// Deepest level any state was created at.
    pub fn max_depth(&self) -> usize {
        self.created_states.len().saturating_sub(1)
    }

    pub(crate) fn add_created(&mut self, node: &SearchNode<'_>) -> bool {
        Self::add(&mut self.created_states, node)
    }

    pub(crate) fn add_unique_visited(&mut self, node: &SearchNode<'_>) -> bool {
        Self::add(&mut self.visited_states, node)
    }

    pub(crate) fn add_reached_duplicate(&mut self, node: &SearchNode<'_>) -> bool {
        Self::add(&mut self.duplicate_states, node)
    }

    /// Returns true when this is the first state at its depth.
    fn add(counts: &mut Vec<u64>, node: &SearchNode<'_>) -> bool {
        let mut ret = false;
        let depth = node.dist as usize;

        // while because DFS can jump several depths between two states
        while depth >= counts.len() {
            counts.push(0);
            ret = true;
        }
        counts[depth] += 1;
        ret
    }
}

impl Debug for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "created by depth: {:?}", self.created_states)?;
        writeln!(f, "reached duplicates by depth: {:?}", self.duplicate_states)?;
        writeln!(f, "unique visited by depth: {:?}", self.visited_states)?;
        writeln!(f, "total created: {}", self.total_created().separated_string())?;
        writeln!(
            f,
            "total reached duplicates: {}",
            self.total_reached_duplicates().separated_string()
        )?;
        writeln!(
            f,
            "total unique visited: {}",
            self.total_unique_visited().separated_string()
        )
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let created = self.total_created();
        let visited = self.total_unique_visited();
        let duplicates = self.total_reached_duplicates();
        let left = created.saturating_sub(visited + duplicates);
        writeln!(f, "States created total: {}", created.separated_string())?;
        writeln!(f, "Unique visited total: {}", visited.separated_string())?;
        writeln!(f, "Reached duplicates total: {}", duplicates.separated_string())?;
        writeln!(f, "Created but not reached total: {}", left.separated_string())?;
        writeln!(f)?;

        writeln!(
            f,
            "{:<15}{:<15}{:<15}{:<15}{}",
            "Depth", "Created", "Unique", "Duplicates", "Unknown (not reached)"
        )?;
        let get = |counts: &Vec<u64>, i: usize| counts.get(i).cloned().unwrap_or(0);
        // created is the longest, everything else was created first
        for i in 0..self.created_states.len() {
            let created = self.created_states[i];
            let visited = get(&self.visited_states, i);
            let duplicates = get(&self.duplicate_states, i);
            let left = created.saturating_sub(visited + duplicates);
            writeln!(
                f,
                "{:<15}{:<15}{:<15}{:<15}{}",
                format!("{}:", i),
                created.separated_string(),
                visited.separated_string(),
                duplicates.separated_string(),
                left.separated_string()
            )?;
        }
        Ok(())
    }
}
