//! Run configuration, as read from TOML, plus a few named presets.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    localsearch::{metaheuristic::AnnealParams, LookAheadParams},
    rails::Rails,
    strategy::StrategyKind,
};

/// How the network a strategy starts from is built
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    /// An empty network
    #[default]
    Clean,
    /// A finished random walk
    Random,
    /// A finished greedy construction
    Greedy,
    /// `line_cap` roots at random stations
    RandomRoots,
    /// `line_cap` roots, stations with an odd number of segments first
    OddRoots,
}

impl StartPolicy {
    pub fn name(self) -> &'static str {
        match self {
            StartPolicy::Clean => "clean",
            StartPolicy::Random => "random",
            StartPolicy::Greedy => "greedy",
            StartPolicy::RandomRoots => "random_roots",
            StartPolicy::OddRoots => "odd_roots",
        }
    }
}

impl FromStr for StartPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clean" => Ok(StartPolicy::Clean),
            "random" => Ok(StartPolicy::Random),
            "greedy" => Ok(StartPolicy::Greedy),
            "random_roots" => Ok(StartPolicy::RandomRoots),
            "odd_roots" => Ok(StartPolicy::OddRoots),
            other => Err(ConfigError::UnknownStartPolicy(other.to_owned())),
        }
    }
}

impl fmt::Display for StartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a [`Runner`](super::Runner) needs besides the rail graph
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    pub strategy: StrategyKind,
    pub start: StartPolicy,
    /// The longest a single line may run, in minutes
    pub max_duration: u32,
    pub line_cap: usize,
    /// End a run as soon as it revisits a network it has seen before
    pub stop_on_backtrack: bool,
    /// Return the best network seen during a run rather than the last one
    pub track_best: bool,
    /// Strip overlapping line ends once a run is over
    pub trim: bool,
    /// Seed for batches of runs; a fresh one is drawn when absent
    pub seed: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            start: StartPolicy::Clean,
            max_duration: 180,
            line_cap: 20,
            stop_on_backtrack: false,
            track_best: false,
            trim: false,
            seed: None,
        }
    }
}

impl RunnerConfig {
    const STANDARD_DURATION: u32 = 180;
    const STANDARD_LINE_CAP: usize = 11;

    pub fn new(strategy: StrategyKind) -> Self {
        Self { strategy, ..Self::default() }
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_start(mut self, start: StartPolicy) -> Self {
        self.start = start;
        self
    }

    pub fn with_max_duration(mut self, max_duration: u32) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn with_line_cap(mut self, line_cap: usize) -> Self {
        self.line_cap = line_cap;
        self
    }

    pub fn with_stop_on_backtrack(mut self, stop: bool) -> Self {
        self.stop_on_backtrack = stop;
        self
    }

    pub fn with_track_best(mut self, track: bool) -> Self {
        self.track_best = track;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check this configuration makes sense on the given graph
    pub fn validate(&self, rails: &Rails) -> Result<(), ConfigError> {
        if self.max_duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.line_cap == 0 {
            return Err(ConfigError::ZeroLineCap);
        }
        let stations = rails.connected_stations();
        if self.line_cap > stations {
            return Err(ConfigError::LineCapExceedsStations { line_cap: self.line_cap, stations });
        }
        if let StrategyKind::SimulatedAnnealing(params) = &self.strategy {
            params.validate()?;
        }
        Ok(())
    }

    /// Greedy construction from an empty network
    pub fn standard_greedy() -> Self {
        Self::new(StrategyKind::Greedy { optimal: false })
            .with_max_duration(Self::STANDARD_DURATION)
            .with_line_cap(Self::STANDARD_LINE_CAP)
    }

    /// Hill climbing from a greedy network
    pub fn standard_hill_climb() -> Self {
        Self::new(StrategyKind::HillClimb)
            .with_start(StartPolicy::Greedy)
            .with_max_duration(Self::STANDARD_DURATION)
            .with_line_cap(Self::STANDARD_LINE_CAP)
    }

    /// One move of look ahead from a greedy network, stopping once it goes in circles
    pub fn standard_look_ahead() -> Self {
        Self::new(StrategyKind::LookAhead(LookAheadParams { depth: 1, iter_cap: None }))
            .with_start(StartPolicy::Greedy)
            .with_max_duration(Self::STANDARD_DURATION)
            .with_line_cap(Self::STANDARD_LINE_CAP)
            .with_stop_on_backtrack(true)
    }

    /// Simulated annealing from a greedy network
    pub fn standard_annealing() -> Self {
        Self::new(StrategyKind::SimulatedAnnealing(AnnealParams { iter_cap: 500, schedule: 10.0 }))
            .with_start(StartPolicy::Greedy)
            .with_max_duration(Self::STANDARD_DURATION)
            .with_line_cap(Self::STANDARD_LINE_CAP)
    }
}
