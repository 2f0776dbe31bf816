use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::tracker::Tracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Bfs,
    Dfs,
    /// Pushes so far plus heuristic - push-optimal with the simple heuristic.
    AStar,
    /// Heuristic only, ignores the cost so far.
    BestFirst,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Algorithm::Bfs => write!(f, "bfs"),
            Algorithm::Dfs => write!(f, "dfs"),
            Algorithm::AStar => write!(f, "a-star"),
            Algorithm::BestFirst => write!(f, "best-first"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = ConfigErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bfs" => Ok(Algorithm::Bfs),
            "dfs" => Ok(Algorithm::Dfs),
            "a-star" | "astar" => Ok(Algorithm::AStar),
            "best-first" => Ok(Algorithm::BestFirst),
            _ => Err(ConfigErr::BadValue("algorithm".to_string(), s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeuristicKind {
    Simple,
    Greedy,
}

impl Display for HeuristicKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            HeuristicKind::Simple => write!(f, "simple"),
            HeuristicKind::Greedy => write!(f, "greedy"),
        }
    }
}

impl FromStr for HeuristicKind {
    type Err = ConfigErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(HeuristicKind::Simple),
            "greedy" => Ok(HeuristicKind::Greedy),
            _ => Err(ConfigErr::BadValue("heuristic".to_string(), s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErr {
    UnknownKey(String),
    /// Key and the value that couldn't be parsed.
    BadValue(String, String),
}

impl Display for ConfigErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErr::UnknownKey(key) => write!(f, "Unknown parameter: {}", key),
            ConfigErr::BadValue(key, value) => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl Error for ConfigErr {}

const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct SolverParams {
    algorithm: Algorithm,
    heuristic: HeuristicKind,
    timeout: Option<Duration>,
    tracker: Option<Box<dyn Tracker>>,
    sample_interval: Duration,
    max_states: Option<usize>,
}

impl SolverParams {
    pub fn new(algorithm: Algorithm) -> Self {
        SolverParams {
            algorithm,
            heuristic: HeuristicKind::Simple,
            timeout: None,
            tracker: None,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            max_states: None,
        }
    }

    /// Parses named parameters as passed by a command layer.
    ///
    /// Durations are in milliseconds. Missing keys keep their defaults,
    /// the algorithm defaults to A*.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self, ConfigErr> {
        let mut params = SolverParams::new(Algorithm::AStar);
        for &(key, value) in pairs {
            let bad_value = || ConfigErr::BadValue(key.to_string(), value.to_string());
            match key {
                "algorithm" => params.algorithm = value.parse()?,
                "heuristic" => params.heuristic = value.parse()?,
                "timeout" => {
                    let ms = value.parse().map_err(|_| bad_value())?;
                    params.timeout = Some(Duration::from_millis(ms));
                }
                "sample-interval" => {
                    let ms: u64 = value.parse().map_err(|_| bad_value())?;
                    if ms == 0 {
                        return Err(bad_value());
                    }
                    params.sample_interval = Duration::from_millis(ms);
                }
                "max-states" => params.max_states = Some(value.parse().map_err(|_| bad_value())?),
                _ => return Err(ConfigErr::UnknownKey(key.to_string())),
            }
        }
        Ok(params)
    }

    pub fn heuristic(mut self, heuristic: HeuristicKind) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Only honored by `SolverTask`, a synchronous solve runs until it finishes.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn tracker(mut self, tracker: Box<dyn Tracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Give up (as not solved) after visiting this many unique states.
    pub fn max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }

    pub fn get_algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn get_heuristic(&self) -> HeuristicKind {
        self.heuristic
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_sample_interval(&self) -> Duration {
        self.sample_interval
    }

    pub fn get_max_states(&self) -> Option<usize> {
        self.max_states
    }

    pub(crate) fn take_tracker(&mut self) -> Option<Box<dyn Tracker>> {
        self.tracker.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for &a in &[
            Algorithm::Bfs,
            Algorithm::Dfs,
            Algorithm::AStar,
            Algorithm::BestFirst,
        ] {
            assert_eq!(a.to_string().parse::<Algorithm>().unwrap(), a);
        }
        for &h in &[HeuristicKind::Simple, HeuristicKind::Greedy] {
            assert_eq!(h.to_string().parse::<HeuristicKind>().unwrap(), h);
        }
    }

    #[test]
    fn parsing_pairs() {
        let params = SolverParams::from_pairs(&[
            ("algorithm", "best-first"),
            ("heuristic", "greedy"),
            ("timeout", "1500"),
            ("max-states", "1000"),
        ])
        .unwrap();
        assert_eq!(params.get_algorithm(), Algorithm::BestFirst);
        assert_eq!(params.get_heuristic(), HeuristicKind::Greedy);
        assert_eq!(params.get_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(params.get_max_states(), Some(1000));
        assert_eq!(params.get_sample_interval(), DEFAULT_SAMPLE_INTERVAL);

        let defaults = SolverParams::from_pairs(&[]).unwrap();
        assert_eq!(defaults.get_algorithm(), Algorithm::AStar);
        assert_eq!(defaults.get_timeout(), None);
    }

    #[test]
    fn parsing_errors() {
        assert_eq!(
            SolverParams::from_pairs(&[("speed", "fast")]).unwrap_err(),
            ConfigErr::UnknownKey("speed".to_string())
        );
        assert_eq!(
            SolverParams::from_pairs(&[("timeout", "soon")]).unwrap_err(),
            ConfigErr::BadValue("timeout".to_string(), "soon".to_string())
        );
        assert_eq!(
            SolverParams::from_pairs(&[("algorithm", "ida")]).unwrap_err(),
            ConfigErr::BadValue("algorithm".to_string(), "ida".to_string())
        );
        assert!(SolverParams::from_pairs(&[("sample-interval", "0")]).is_err());
    }
}
