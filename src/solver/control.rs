use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Running,
    Paused,
    Stopped,
}

impl ControlState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ControlState::Running,
            1 => ControlState::Paused,
            _ => ControlState::Stopped,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            ControlState::Running => 0,
            ControlState::Paused => 1,
            ControlState::Stopped => 2,
        }
    }
}

/// Pause / resume / stop requests for a running search.
///
/// The search polls it on every iteration and while expanding a state.
/// Stopped is final.
#[derive(Debug)]
pub struct SolverControl {
    state: AtomicU8,
    lock: Mutex<()>,
    changed: Condvar,
}

impl SolverControl {
    pub fn new() -> Self {
        SolverControl {
            state: AtomicU8::new(ControlState::Running.to_u8()),
            lock: Mutex::new(()),
            changed: Condvar::new(),
        }
    }

    pub fn state(&self) -> ControlState {
        ControlState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == ControlState::Stopped
    }

    /// Returns false unless the search was running.
    pub fn pause(&self) -> bool {
        self.transition(ControlState::Running, ControlState::Paused)
    }

    /// Returns false unless the search was paused.
    pub fn resume(&self) -> bool {
        self.transition(ControlState::Paused, ControlState::Running)
    }

    pub fn stop(&self) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.state
            .store(ControlState::Stopped.to_u8(), Ordering::SeqCst);
        self.changed.notify_all();
    }

    /// Blocks while paused, returns whether the search should stop.
    pub(crate) fn checkpoint(&self) -> bool {
        match self.state() {
            ControlState::Running => false,
            ControlState::Stopped => true,
            ControlState::Paused => {
                let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
                while self.state() == ControlState::Paused {
                    guard = self
                        .changed
                        .wait(guard)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                self.is_stopped()
            }
        }
    }

    fn transition(&self, from: ControlState, to: ControlState) -> bool {
        // under the lock so a paused searcher can't miss the wake up
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let ok = self
            .state
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if ok {
            self.changed.notify_all();
        }
        ok
    }
}

impl Default for SolverControl {
    fn default() -> Self {
        Self::new()
    }
}
