//! Live counters of a running search and periodic samples of them.

use std::fmt::{self, Debug, Display, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use prettytable::{format, Cell, Row, Table};
use separator::Separatable;

/// Read-only view of a search in progress.
///
/// Counters are negative until the search starts.
pub trait Trackable: Send + Sync {
    fn n_state_explored(&self) -> i64;

    fn current_queue_size(&self) -> i64;

    fn time_started(&self) -> Option<Instant>;

    fn time_ended(&self) -> Option<Instant>;
}

const NOT_STARTED: i64 = -1;

/// Counters updated by the search thread, read by whoever samples them.
#[derive(Debug)]
pub struct SearchProgress {
    explored: AtomicI64,
    queue_size: AtomicI64,
    started: Mutex<Option<Instant>>,
    ended: Mutex<Option<Instant>>,
}

impl SearchProgress {
    pub fn new() -> Self {
        SearchProgress {
            explored: AtomicI64::new(NOT_STARTED),
            queue_size: AtomicI64::new(NOT_STARTED),
            started: Mutex::new(None),
            ended: Mutex::new(None),
        }
    }

    pub(crate) fn start(&self) {
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        *self.ended.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.explored.store(0, Ordering::Relaxed);
        self.queue_size.store(0, Ordering::Relaxed);
    }

    pub(crate) fn set_explored(&self, explored: u64) {
        self.explored.store(explored as i64, Ordering::Relaxed);
    }

    pub(crate) fn set_queue_size(&self, size: usize) {
        self.queue_size.store(size as i64, Ordering::Relaxed);
    }

    pub(crate) fn finish(&self) {
        *self.ended.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }
}

impl Default for SearchProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Trackable for SearchProgress {
    fn n_state_explored(&self) -> i64 {
        self.explored.load(Ordering::Relaxed)
    }

    fn current_queue_size(&self) -> i64 {
        self.queue_size.load(Ordering::Relaxed)
    }

    fn time_started(&self) -> Option<Instant> {
        *self.started.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn time_ended(&self) -> Option<Instant> {
        *self.ended.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Collects samples of a `Trackable`.
pub trait Tracker: Send + Debug {
    fn update_statistics(&mut self, trackable: &dyn Trackable);

    fn reset(&mut self);

    fn statistics(&self, trackable: &dyn Trackable) -> SolverStatistics;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Since the search started.
    pub elapsed: Duration,
    pub explored: u64,
    pub queue_size: u64,
}

/// Keeps every sample it's given.
#[derive(Debug, Clone, Default)]
pub struct SamplingTracker {
    samples: Vec<Sample>,
}

impl SamplingTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tracker for SamplingTracker {
    fn update_statistics(&mut self, trackable: &dyn Trackable) {
        let explored = trackable.n_state_explored();
        let queue_size = trackable.current_queue_size();
        let started = match trackable.time_started() {
            Some(started) => started,
            None => return,
        };
        if explored < 0 || queue_size < 0 {
            return;
        }
        let at = trackable.time_ended().unwrap_or_else(Instant::now);
        self.samples.push(Sample {
            elapsed: at.duration_since(started),
            explored: explored as u64,
            queue_size: queue_size as u64,
        });
    }

    fn reset(&mut self) {
        self.samples.clear();
    }

    fn statistics(&self, trackable: &dyn Trackable) -> SolverStatistics {
        SolverStatistics {
            samples: self.samples.clone(),
            explored: trackable.n_state_explored().max(0) as u64,
            time_started: trackable.time_started(),
            time_ended: trackable.time_ended(),
        }
    }
}

/// States explored and frontier size over time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverStatistics {
    pub samples: Vec<Sample>,
    pub explored: u64,
    pub time_started: Option<Instant>,
    pub time_ended: Option<Instant>,
}

impl SolverStatistics {
    /// `None` while running or if it never ran.
    pub fn duration(&self) -> Option<Duration> {
        match (self.time_started, self.time_ended) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    pub fn max_queue_size(&self) -> u64 {
        self.samples.iter().map(|s| s.queue_size).max().unwrap_or(0)
    }
}

impl Display for SolverStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.duration() {
            Some(duration) => writeln!(
                f,
                "Explored {} states in {}.{:03} s",
                self.explored.separated_string(),
                duration.as_secs(),
                duration.subsec_millis()
            )?,
            None => writeln!(f, "Explored {} states", self.explored.separated_string())?,
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.set_titles(Row::new(vec![
            Cell::new("Time (ms)"),
            Cell::new("Explored"),
            Cell::new("Queue size"),
        ]));
        for sample in &self.samples {
            table.add_row(Row::new(vec![
                Cell::new(&sample.elapsed.as_millis().to_string()),
                Cell::new(&sample.explored.separated_string()),
                Cell::new(&sample.queue_size.separated_string()),
            ]));
        }
        write!(f, "{}", table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_started_is_skipped() {
        let progress = SearchProgress::new();
        let mut tracker = SamplingTracker::new();
        tracker.update_statistics(&progress);
        let stats = tracker.statistics(&progress);
        assert!(stats.samples.is_empty());
        assert_eq!(stats.explored, 0);
        assert_eq!(stats.duration(), None);
    }

    #[test]
    fn samples() {
        let progress = SearchProgress::new();
        let mut tracker = SamplingTracker::new();
        progress.start();
        progress.set_explored(10);
        progress.set_queue_size(4);
        tracker.update_statistics(&progress);
        progress.set_explored(1500);
        progress.set_queue_size(2);
        progress.finish();
        tracker.update_statistics(&progress);

        let stats = tracker.statistics(&progress);
        assert_eq!(stats.samples.len(), 2);
        assert_eq!(stats.samples[1].explored, 1500);
        assert_eq!(stats.max_queue_size(), 4);
        assert_eq!(stats.explored, 1500);
        assert!(stats.duration().is_some());
        assert!(stats.samples[0].elapsed <= stats.samples[1].elapsed);

        let text = stats.to_string();
        assert!(text.starts_with("Explored 1,500 states in "));
        assert!(text.contains("Queue size"));

        tracker.reset();
        assert!(tracker.statistics(&progress).samples.is_empty());
    }
}
