//! Drives a strategy from a starting network to its end, and repeats runs to
//! gather the best or typical results.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    baseline::{Greedy, RandomWalk},
    error::ConfigError,
    moves::Addition,
    network::{Network, NetworkState},
    rails::Rails,
    strategy::Strategy,
};

pub mod config;

pub use config::{RunnerConfig, StartPolicy};

type Observer<'r> = Box<dyn Fn(&Network<'_>) + Send + Sync + 'r>;

/// A validated run configuration on a rail graph
pub struct Runner<'r> {
    rails: &'r Rails,
    config: RunnerConfig,
    observer: Option<Observer<'r>>,
}

impl<'r> Runner<'r> {
    pub fn new(rails: &'r Rails, config: RunnerConfig) -> Result<Self, ConfigError> {
        config.validate(rails)?;
        Ok(Self { rails, config, observer: None })
    }

    /// Call `hook` with every intermediate network of every run
    pub fn with_observer(mut self, hook: impl Fn(&Network<'_>) + Send + Sync + 'r) -> Self {
        self.observer = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn rails(&self) -> &'r Rails {
        self.rails
    }

    /// The name of the configured strategy
    pub fn name(&self) -> &'static str {
        self.config.strategy.name()
    }

    /// Run once with a fresh random stream
    pub fn run(&self) -> Network<'r> {
        self.run_with(&mut fastrand::Rng::new())
    }

    /// Run once, drawing all randomness from `rng`
    #[tracing::instrument(
        level = "debug",
        name = "Run",
        skip(self, rng),
        fields(strategy = self.name())
    )]
    pub fn run_with(&self, rng: &mut fastrand::Rng) -> Network<'r> {
        let base = self.start(rng);
        let mut strategy = self.config.strategy.build(base, self.config.line_cap);
        let mut visited: HashSet<NetworkState> = HashSet::new();
        if self.config.stop_on_backtrack {
            visited.insert(strategy.active().state());
        }
        let mut best = self.config.track_best.then(|| strategy.active().clone());
        let mut steps = 0usize;

        while let Some(net) = strategy.next_state(rng) {
            steps += 1;
            if let Some(hook) = &self.observer {
                hook(net);
            }
            if let Some(best) = best.as_mut().filter(|b| net.quality() > b.quality()) {
                *best = net.clone();
            }
            if self.config.stop_on_backtrack && !visited.insert(net.state()) {
                debug!(steps, "{}: revisited a network, stopping", strategy.name());
                break;
            }
        }

        let mut result = best.unwrap_or_else(|| strategy.into_network());
        if self.config.trim {
            let trimmed = result.trim();
            debug!(trimmed, "Trimmed overlapping line ends");
        }
        debug!(
            steps,
            quality = result.quality(),
            coverage = result.coverage(),
            lines = result.lines().len(),
            "Run finished"
        );
        result
    }

    /// Build the network a run starts from
    fn start(&self, rng: &mut fastrand::Rng) -> Network<'r> {
        let clean = Network::new(self.rails, self.config.max_duration);
        let line_cap = self.config.line_cap;
        match self.config.start {
            StartPolicy::Clean => clean,
            StartPolicy::Random => exhaust(RandomWalk::new(clean, line_cap), rng),
            StartPolicy::Greedy => exhaust(Greedy::new(clean, line_cap, false), rng),
            StartPolicy::RandomRoots => {
                let roots = rng.choose_multiple(clean.additions(), line_cap);
                with_roots(clean, roots)
            }
            StartPolicy::OddRoots => {
                let mut roots: Vec<Addition> = clean.additions().collect();
                rng.shuffle(&mut roots);
                roots.sort_by_key(|a| clean.free_degree(a.root()) % 2 == 0);
                roots.truncate(line_cap);
                with_roots(clean, roots)
            }
        }
    }

    /// Independent runs, one after another, seeded from the configured seed if any
    pub fn runs(&self, bound: Option<usize>) -> impl Iterator<Item = Network<'r>> + '_ {
        let mut rng = self.master_rng();
        std::iter::repeat_with(move || self.run_with(&mut rng)).take(bound.unwrap_or(usize::MAX))
    }

    /// Run until a network covers every segment. May never return on a graph that
    /// cannot be covered within the caps.
    pub fn run_till_cover(&self) -> Network<'r> {
        let mut rng = self.master_rng();
        loop {
            let net = self.run_with(&mut rng);
            if net.fully_covered() {
                return net;
            }
        }
    }

    /// Run until a network covers every segment exactly once. May never return on a
    /// graph without such a network.
    pub fn run_till_optimal(&self) -> Network<'r> {
        let mut rng = self.master_rng();
        loop {
            let net = self.run_with(&mut rng);
            if net.is_optimal() {
                return net;
            }
        }
    }

    /// The best of `bound` runs, evaluated in parallel. Every run completes, even
    /// after one turns out optimal, so the result only depends on the seed.
    pub fn best(&self, bound: usize) -> Option<Network<'r>> {
        let best = self
            .seeds(bound)
            .into_par_iter()
            .map(|seed| self.run_with(&mut fastrand::Rng::with_seed(seed)))
            .max_by(|a, b| a.quality().total_cmp(&b.quality()));
        if let Some(net) = &best {
            info!(runs = bound, quality = net.quality(), "{}: best of batch", self.name());
        }
        best
    }

    /// Mean quality over `count` runs, evaluated in parallel
    pub fn average(&self, count: usize) -> Option<f64> {
        if count == 0 {
            return None;
        }
        let total: f64 = self.qualities(count).into_iter().sum();
        let average = total / count as f64;
        info!(runs = count, average, "{}: batch average", self.name());
        Some(average)
    }

    /// Mean quality of the best `100 - p` percent of `bound` runs
    pub fn percentile(&self, p: f64, bound: usize) -> Option<f64> {
        if bound == 0 {
            return None;
        }
        let count = ((bound as f64 * (1.0 - p / 100.0)).round() as usize).clamp(1, bound);
        let mut qualities = self.qualities(bound);
        qualities.sort_unstable_by(|a, b| b.total_cmp(a));
        let average = qualities[..count].iter().sum::<f64>() / count as f64;
        info!(runs = bound, top = count, average, "{}: percentile {}", self.name(), p);
        Some(average)
    }

    fn qualities(&self, count: usize) -> Vec<f64> {
        self.seeds(count)
            .into_par_iter()
            .map(|seed| self.run_with(&mut fastrand::Rng::with_seed(seed)).quality())
            .collect()
    }

    fn master_rng(&self) -> fastrand::Rng {
        self.config.seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed)
    }

    /// One seed per run, so parallel batches are reproducible
    fn seeds(&self, count: usize) -> Vec<u64> {
        let mut rng = self.master_rng();
        (0..count).map(|_| rng.u64(..)).collect()
    }
}

/// Step a strategy until it is done
fn exhaust<'r, S: Strategy<'r>>(mut strategy: S, rng: &mut fastrand::Rng) -> Network<'r> {
    while strategy.next_state(rng).is_some() {}
    Box::new(strategy).into_network()
}

fn with_roots<'r>(mut net: Network<'r>, roots: Vec<Addition>) -> Network<'r> {
    for root in roots {
        net.apply(root.into());
    }
    net
}
