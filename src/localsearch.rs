//! Implements local search strategies, which move between whole neighbouring
//! networks instead of building one up move by move.

use std::collections::HashSet;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    network::{Network, NetworkState},
    strategy::{first_max_by_key, Strategy},
};

pub mod metaheuristic;

/// Defines a metaheuristic: the policy deciding which neighbour a local
/// search moves to next, such as first improvement or simulated annealing
pub trait Metaheuristic {
    type Params: Clone;

    /// A short name for the search this policy drives
    const NAME: &'static str;

    /// Construct this metaheuristic from parameters
    fn new(params: Self::Params) -> Self;

    /// Select a neighbour to move to, given the quality of the current network;
    /// `None` ends the search
    fn choose_update<'r>(
        &mut self,
        candidates: Vec<Network<'r>>,
        quality: f64,
        rng: &mut fastrand::Rng,
    ) -> Option<Network<'r>>;
}

/// A local search over every network one move away, driven by a metaheuristic
#[derive(Debug, Clone)]
pub struct LocalSearch<'r, M: Metaheuristic> {
    net: Network<'r>,
    line_cap: usize,
    mh: M,
}

impl<'r, M: Metaheuristic> LocalSearch<'r, M> {
    pub fn new(base: Network<'r>, line_cap: usize, params: M::Params) -> Self {
        Self { net: base, line_cap, mh: M::new(params) }
    }

    pub fn metaheuristic(&self) -> &M {
        &self.mh
    }
}

impl<'r, M: Metaheuristic> Strategy<'r> for LocalSearch<'r, M> {
    fn name(&self) -> &'static str {
        M::NAME
    }

    fn active(&self) -> &Network<'r> {
        &self.net
    }

    fn next_state(&mut self, rng: &mut fastrand::Rng) -> Option<&Network<'r>> {
        let candidates: Vec<_> = self.net.state_neighbours(self.line_cap, false, false).collect();
        if candidates.is_empty() {
            debug!("{}: no neighbours", M::NAME);
            return None;
        }
        self.net = self.mh.choose_update(candidates, self.net.quality(), rng)?;
        Some(&self.net)
    }

    fn into_network(self: Box<Self>) -> Network<'r> {
        self.net
    }
}

/// Moves to the first neighbour that improves on the current quality, visiting
/// neighbours in random order. Stops at a local optimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstImprovement;

impl Metaheuristic for FirstImprovement {
    type Params = ();

    const NAME: &'static str = "hill climb";

    fn new(_params: Self::Params) -> Self {
        Self
    }

    fn choose_update<'r>(
        &mut self,
        mut candidates: Vec<Network<'r>>,
        quality: f64,
        rng: &mut fastrand::Rng,
    ) -> Option<Network<'r>> {
        rng.shuffle(&mut candidates);
        let found = candidates.into_iter().find(|n| n.quality() > quality);
        if found.is_none() {
            debug!(quality, "Hill climb: local optimum reached");
        }
        found
    }
}

pub type HillClimb<'r> = LocalSearch<'r, FirstImprovement>;

/// Parameters for [`LookAhead`]
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct LookAheadParams {
    /// How many further moves to explore below every neighbour
    pub depth: usize,
    /// Stop after this many steps, if set
    pub iter_cap: Option<usize>,
}

impl Default for LookAheadParams {
    fn default() -> Self {
        Self { depth: 1, iter_cap: None }
    }
}

/// Best first search: ranks every neighbour by the best quality reachable within
/// `depth` further moves, and moves to the highest ranked one. It has converged
/// once nothing in reach beats the network it stands on, and it never returns to
/// a network it already passed through.
///
/// Exponential in `depth`, which should stay small.
#[derive(Debug, Clone)]
pub struct LookAhead<'r> {
    net: Network<'r>,
    line_cap: usize,
    params: LookAheadParams,
    iterations: usize,
    visited: HashSet<NetworkState>,
}

impl<'r> LookAhead<'r> {
    pub fn new(base: Network<'r>, line_cap: usize, params: LookAheadParams) -> Self {
        let visited = HashSet::from([base.state()]);
        Self { net: base, line_cap, params, iterations: 0, visited }
    }

    /// `score(n, 0) = quality(n)`, otherwise the best of `quality(n)` and the scores
    /// of all neighbours one level down
    pub fn look_ahead(&self, base: &Network<'r>, depth: usize) -> f64 {
        let quality = base.quality();
        if depth == 0 {
            return quality;
        }
        base.state_neighbours(self.line_cap, false, false)
            .map(|n| self.look_ahead(&n, depth - 1))
            .fold(quality, f64::max)
    }
}

impl<'r> Strategy<'r> for LookAhead<'r> {
    fn name(&self) -> &'static str {
        "look ahead"
    }

    fn active(&self) -> &Network<'r> {
        &self.net
    }

    fn next_state(&mut self, _rng: &mut fastrand::Rng) -> Option<&Network<'r>> {
        if self.params.iter_cap.is_some_and(|cap| self.iterations >= cap) {
            return None;
        }
        let mut candidates: Vec<_> =
            self.net.state_neighbours(self.line_cap, false, false).collect();
        // Equal scores go to the better network right now, then to the earliest
        let ranked = first_max_by_key(
            candidates
                .iter()
                .enumerate()
                .map(|(i, n)| (i, self.look_ahead(n, self.params.depth))),
            |&(i, score)| (OrderedFloat(score), OrderedFloat(candidates[i].quality())),
        );
        let Some((best, score)) = ranked else {
            debug!("Look ahead: no neighbours");
            return None;
        };
        if score <= self.net.quality() {
            debug!(score, "Look ahead: nothing in reach beats the active network");
            return None;
        }
        let next = candidates.swap_remove(best);
        if !self.visited.insert(next.state()) {
            debug!(score, "Look ahead: best neighbour was already visited");
            return None;
        }
        self.net = next;
        self.iterations += 1;
        Some(&self.net)
    }

    fn into_network(self: Box<Self>) -> Network<'r> {
        self.net
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rails::fixtures::{lattice, square};

    /// Ensures hill climbing only ever moves uphill and ends at a local optimum
    #[test]
    fn test_hill_climb_improves() {
        let rails = lattice();
        let mut rng = fastrand::Rng::with_seed(2);
        let mut climb = HillClimb::new(Network::new(&rails, 180), 3, ());
        let mut quality = climb.active().quality();
        while let Some(net) = climb.next_state(&mut rng) {
            assert!(net.quality() > quality, "Ensure every step improves quality");
            quality = net.quality();
        }
        let net = climb.active();
        assert!(net.state_neighbours(3, false, false).all(|n| n.quality() <= quality));
    }

    /// Ensures look ahead scores a network by the best reachable quality
    #[test]
    fn test_look_ahead_score() {
        let rails = square();
        let mut net = Network::new(&rails, 100);
        let line = net.add_line(rails.id_of("A").unwrap());
        net.extend_line(line, rails.id_of("B").unwrap()).unwrap();
        let search = LookAhead::new(net.clone(), 1, LookAheadParams { depth: 2, iter_cap: None });
        assert_eq!(search.look_ahead(&net, 0), net.quality());
        // Two more new segments: 3 of 4 covered, one line of 30 minutes
        assert_eq!(search.look_ahead(&net, 2), 7500.0 - 130.0);
        assert_eq!(search.look_ahead(&net, 1), 5000.0 - 120.0);
    }

    /// Ensures look ahead converges on the square and respects its iteration cap
    #[test]
    fn test_look_ahead_run() {
        let rails = square();
        let mut rng = fastrand::Rng::new();
        let mut search = LookAhead::new(Network::new(&rails, 100), 1, LookAheadParams::default());
        let mut steps = 0;
        while search.next_state(&mut rng).is_some() {
            steps += 1;
            assert!(steps < 100, "Ensure look ahead converges");
        }
        assert!(search.active().is_optimal());

        let params = LookAheadParams { depth: 1, iter_cap: Some(2) };
        let mut capped = LookAhead::new(Network::new(&rails, 100), 1, params);
        assert!(capped.next_state(&mut rng).is_some());
        assert!(capped.next_state(&mut rng).is_some());
        assert!(capped.next_state(&mut rng).is_none());
    }

    /// Ensures a deeper look ahead walks through a worse network to reach a better one
    #[test]
    fn test_look_ahead_through_dip() {
        let rails = square();
        let mut rng = fastrand::Rng::with_seed(0);
        // Lines may only run a single segment, and adding a root costs quality at first
        let params = LookAheadParams { depth: 2, iter_cap: None };
        let mut search = LookAhead::new(Network::new(&rails, 10), 1, params);
        let mut steps = 0;
        while search.next_state(&mut rng).is_some() {
            steps += 1;
        }
        assert_eq!(steps, 2, "Ensure the search adds a root and then extends it");
        assert_eq!(search.active().quality(), 2500.0 - 110.0);

        let mut search = LookAhead::new(Network::new(&rails, 100), 1, params);
        let mut steps = 0;
        while search.next_state(&mut rng).is_some() {
            steps += 1;
            assert!(steps < 100, "Ensure look ahead converges");
        }
        assert!(search.active().is_optimal());
        assert_eq!(steps, 5);
    }
}
