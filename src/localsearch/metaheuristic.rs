//! Defines the simulated annealing metaheuristic

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{error::ConfigError, network::Network};

use super::{LocalSearch, Metaheuristic};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AnnealParams {
    /// The number of steps before the temperature reaches zero
    pub iter_cap: usize,
    /// The starting temperature, which cools linearly
    pub schedule: f64,
}

impl Default for AnnealParams {
    fn default() -> Self {
        Self { iter_cap: 500, schedule: 10.0 }
    }
}

impl AnnealParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iter_cap == 0 {
            return Err(ConfigError::InvalidAnnealing(
                "the iteration cap must be at least 1".into(),
            ));
        }
        if !(self.schedule.is_finite() && self.schedule > 0.0) {
            return Err(ConfigError::InvalidAnnealing(format!(
                "the schedule must be positive, got {}",
                self.schedule
            )));
        }
        Ok(())
    }

    /// `T(i) = schedule * (1 - i / iter_cap)`
    pub fn temperature(&self, iteration: usize) -> f64 {
        self.schedule * (1.0 - iteration as f64 / self.iter_cap as f64)
    }
}

/// The chance of moving from a network of quality `current` to one of quality
/// `candidate`: certain when it is no worse, `exp(dq / T)` otherwise
pub fn acceptance_probability(current: f64, candidate: f64, temperature: f64) -> f64 {
    ((candidate - current).min(0.0) / temperature).exp()
}

#[derive(Debug, Clone)]
pub struct Anneal {
    params: AnnealParams,
    iteration: usize,
}

impl Anneal {
    pub fn iteration(&self) -> usize {
        self.iteration
    }
}

impl Metaheuristic for Anneal {
    type Params = AnnealParams;

    const NAME: &'static str = "simulated annealing";

    fn new(params: Self::Params) -> Self {
        Self { params, iteration: 0 }
    }

    fn choose_update<'r>(
        &mut self,
        mut candidates: Vec<Network<'r>>,
        quality: f64,
        rng: &mut fastrand::Rng,
    ) -> Option<Network<'r>> {
        if self.iteration >= self.params.iter_cap {
            debug!(iterations = self.iteration, "Simulated annealing: iteration cap reached");
            return None;
        }
        let temp = self.params.temperature(self.iteration);
        self.iteration += 1;
        rng.shuffle(&mut candidates);
        let accepted = candidates
            .iter()
            .position(|n| rng.f64() < acceptance_probability(quality, n.quality(), temp));
        trace!(temp, accepted = accepted.is_some(), "Simulated annealing step");
        match accepted {
            Some(i) => Some(candidates.swap_remove(i)),
            // Nothing accepted, so the walk takes any neighbour
            None => rng.choice(candidates),
        }
    }
}

/// Local search that accepts worse neighbours with a probability that falls as the
/// temperature cools, so it can escape local optima early on
pub type SimulatedAnnealing<'r> = LocalSearch<'r, Anneal>;
