//! Runs a search on a background thread while another thread samples its progress.

use std::any::Any;
use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::board::Board;
use crate::config::SolverParams;
use crate::solver::{self, ControlState, Solution, SolverControl, SolverErr};
use crate::tracker::{SamplingTracker, SearchProgress, SolverStatistics, Trackable, Tracker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskErr {
    AlreadyStarted,
    NotStarted,
    /// The worker panicked, contains the panic message.
    Panicked(String),
    Solver(SolverErr),
}

impl Display for TaskErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TaskErr::AlreadyStarted => write!(f, "Task already started"),
            TaskErr::NotStarted => write!(f, "Task not started"),
            TaskErr::Panicked(msg) => write!(f, "Solver panicked: {}", msg),
            TaskErr::Solver(err) => write!(f, "{}", err),
        }
    }
}

impl Error for TaskErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TaskErr::Solver(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SolverErr> for TaskErr {
    fn from(err: SolverErr) -> Self {
        TaskErr::Solver(err)
    }
}

/// Called on the worker thread once the search ends, whether solved, exhausted or stopped.
pub type EndCallback = Box<dyn FnOnce(&Result<Solution, TaskErr>) + Send>;

/// A search of one board on its own thread.
///
/// The board moves into the worker so nothing else can touch its marks during the search.
/// A task runs at most once. Dropping a running task stops the search.
pub struct SolverTask {
    pending: Option<(Board, SolverParams)>,
    control: Arc<SolverControl>,
    progress: Arc<SearchProgress>,
    tracker: Arc<Mutex<Box<dyn Tracker>>>,
    on_end: Option<EndCallback>,
    worker: Option<JoinHandle<Result<Solution, TaskErr>>>,
}

impl SolverTask {
    pub fn new(board: Board, mut params: SolverParams) -> Self {
        let tracker = params
            .take_tracker()
            .unwrap_or_else(|| Box::new(SamplingTracker::new()));
        SolverTask {
            pending: Some((board, params)),
            control: Arc::new(SolverControl::new()),
            progress: Arc::new(SearchProgress::new()),
            tracker: Arc::new(Mutex::new(tracker)),
            on_end: None,
            worker: None,
        }
    }

    /// Must be registered before `start`.
    pub fn on_end<F>(&mut self, callback: F) -> Result<(), TaskErr>
    where
        F: FnOnce(&Result<Solution, TaskErr>) + Send + 'static,
    {
        if self.pending.is_none() {
            return Err(TaskErr::AlreadyStarted);
        }
        self.on_end = Some(Box::new(callback));
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), TaskErr> {
        let (board, params) = self.pending.take().ok_or(TaskErr::AlreadyStarted)?;
        debug!("Starting task: {}", params.get_algorithm());

        let done = Arc::new(AtomicBool::new(false));
        let sampler = Sampler {
            control: Arc::clone(&self.control),
            progress: Arc::clone(&self.progress),
            tracker: Arc::clone(&self.tracker),
            done: Arc::clone(&done),
            interval: params.get_sample_interval(),
            timeout: params.get_timeout(),
        };
        let sampler = thread::spawn(move || sampler.run());

        let control = Arc::clone(&self.control);
        let progress = Arc::clone(&self.progress);
        let tracker = Arc::clone(&self.tracker);
        let on_end = self.on_end.take();
        self.worker = Some(thread::spawn(move || {
            let searched = panic::catch_unwind(AssertUnwindSafe(|| {
                solver::search(&board, &params, &control, &progress, None)
            }));

            // let the sampler take its last sample before reading the statistics
            done.store(true, Ordering::SeqCst);
            sampler.thread().unpark();
            if sampler.join().is_err() {
                warn!("Sampler thread panicked");
            }

            let result = match searched {
                Ok(Ok(outcome)) => {
                    let statistics = lock(&tracker).statistics(&*progress);
                    Ok(Solution::new(outcome, statistics, &params))
                }
                Ok(Err(err)) => Err(TaskErr::Solver(err)),
                Err(payload) => Err(TaskErr::Panicked(panic_message(&*payload))),
            };
            if let Some(on_end) = on_end {
                on_end(&result);
            }
            result
        }));
        Ok(())
    }

    /// Asks the search to stop, it ends with `SolveStatus::Stopped` at its next checkpoint.
    /// Stopping a task that hasn't started makes it stop right after starting.
    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn pause(&self) -> bool {
        self.control.pause()
    }

    pub fn resume(&self) -> bool {
        self.control.resume()
    }

    pub fn control_state(&self) -> ControlState {
        self.control.state()
    }

    /// Samples taken so far, usable while the search is running.
    pub fn statistics(&self) -> SolverStatistics {
        lock(&self.tracker).statistics(&*self.progress)
    }

    /// Blocks until the worker ends. The `on_end` callback has run by then.
    pub fn join(mut self) -> Result<Solution, TaskErr> {
        let worker = self.worker.take().ok_or(TaskErr::NotStarted)?;
        worker
            .join()
            .unwrap_or_else(|payload| Err(TaskErr::Panicked(panic_message(&*payload))))
    }
}

impl Drop for SolverTask {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.control.stop();
        }
    }
}

impl Debug for SolverTask {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverTask")
            .field("started", &self.pending.is_none())
            .field("control", &self.control.state())
            .field("progress", &self.progress)
            .finish()
    }
}

/// Periodically feeds the tracker and enforces the timeout.
struct Sampler {
    control: Arc<SolverControl>,
    progress: Arc<SearchProgress>,
    tracker: Arc<Mutex<Box<dyn Tracker>>>,
    done: Arc<AtomicBool>,
    interval: Duration,
    timeout: Option<Duration>,
}

impl Sampler {
    fn run(self) {
        let mut last_sample = Instant::now();
        loop {
            thread::park_timeout(self.interval);
            // parking can wake up spuriously
            let done = self.done.load(Ordering::SeqCst);
            if done || last_sample.elapsed() >= self.interval {
                lock(&self.tracker).update_statistics(&*self.progress);
                last_sample = Instant::now();
            }
            if done {
                return;
            }

            if let (Some(timeout), Some(started)) = (self.timeout, self.progress.time_started()) {
                if started.elapsed() >= timeout && !self.control.is_stopped() {
                    debug!("Timed out after {:?}", timeout);
                    self.control.stop();
                }
            }
        }
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}
