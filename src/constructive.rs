//! A generic constructive strategy, customised by a heuristic that scores every
//! candidate move and an adjuster that turns the scores into selection weights.

use tracing::{debug, trace};

use crate::{
    moves::Move,
    network::Network,
    strategy::Strategy,
};

pub mod adjusters;
pub mod heuristics;

use adjusters::Adjuster;
use heuristics::Heuristic;

/// Grows a network by sampling construction moves in proportion to their adjusted
/// scores, until it is fully covered or no candidate carries any weight
pub struct Constructive<'r> {
    net: Network<'r>,
    line_cap: usize,
    heuristic: Box<dyn Heuristic>,
    adjuster: Adjuster,
}

impl<'r> Constructive<'r> {
    pub fn new(
        base: Network<'r>,
        line_cap: usize,
        heuristic: Box<dyn Heuristic>,
        adjuster: Adjuster,
    ) -> Self {
        Self { net: base, line_cap, heuristic, adjuster }
    }

    /// Use any heuristic, such as a plain function
    pub fn with_heuristic(
        base: Network<'r>,
        line_cap: usize,
        heuristic: impl Heuristic + 'static,
        adjuster: Adjuster,
    ) -> Self {
        Self::new(base, line_cap, Box::new(heuristic), adjuster)
    }

    /// Pick the next move to commit, if any candidate carries weight
    pub fn next_move(&self, rng: &mut fastrand::Rng) -> Option<Move> {
        let can_add = self.net.lines().len() < self.line_cap;
        let mut moves: Vec<Move> = self.net.constructions(can_add).collect();
        if moves.is_empty() {
            return None;
        }
        let scores: Vec<f64> =
            moves.iter().map(|mv| self.heuristic.score(&self.net, mv, rng)).collect();
        let weights = self.adjuster.adjust(&scores);
        let chosen = adjusters::sample(&weights, rng)?;
        trace!(candidates = moves.len(), chosen, "Constructive: sampled a move");
        Some(moves.swap_remove(chosen))
    }
}

impl<'r> Strategy<'r> for Constructive<'r> {
    fn name(&self) -> &'static str {
        "constructive"
    }

    fn active(&self) -> &Network<'r> {
        &self.net
    }

    fn next_state(&mut self, rng: &mut fastrand::Rng) -> Option<&Network<'r>> {
        if self.net.fully_covered() {
            return None;
        }
        let Some(mv) = self.next_move(rng) else {
            debug!(coverage = self.net.coverage(), "Constructive: no weighted candidate left");
            return None;
        };
        self.net.apply(mv);
        Some(&self.net)
    }

    fn into_network(self: Box<Self>) -> Network<'r> {
        self.net
    }
}
