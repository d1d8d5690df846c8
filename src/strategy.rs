//! The common shape of every search strategy, and a serialisable way to pick one.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    baseline::{Greedy, RandomWalk},
    constructive::{adjusters::Adjuster, heuristics::HeuristicKind, Constructive},
    localsearch::{
        metaheuristic::{AnnealParams, SimulatedAnnealing},
        HillClimb, LookAhead, LookAheadParams,
    },
    network::Network,
};

/// A search strategy walks the state space one network at a time.
///
/// Each call to [`Strategy::next_state`] commits one move (or jumps to one neighbouring
/// network) and returns the new active network, or `None` once the strategy is done.
/// Strategies draw all their randomness from the stream they are handed, so a run is
/// reproducible from its seed.
pub trait Strategy<'r> {
    /// A short, human readable name
    fn name(&self) -> &'static str;

    /// The network the strategy currently stands on
    fn active(&self) -> &Network<'r>;

    /// Advance one step
    fn next_state(&mut self, rng: &mut fastrand::Rng) -> Option<&Network<'r>>;

    /// Give up the active network
    fn into_network(self: Box<Self>) -> Network<'r>;
}

/// Which strategy a run uses, with its parameters
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyKind {
    /// Extend with the best new segment, add roots when stuck
    Greedy {
        /// Stop instead of ever running a segment twice
        #[serde(default)]
        optimal: bool,
    },
    /// Random roots, then random extensions
    Random,
    /// First improving neighbour, in random order
    HillClimb,
    LookAhead(LookAheadParams),
    SimulatedAnnealing(AnnealParams),
    /// A heuristic scores every construction, an adjuster turns the scores into odds
    Constructive {
        heuristic: HeuristicKind,
        adjuster: Adjuster,
    },
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::Greedy { optimal: false }
    }
}

impl StrategyKind {
    /// Start this strategy on `base`, never exceeding `line_cap` lines
    pub fn build<'r>(&self, base: Network<'r>, line_cap: usize) -> Box<dyn Strategy<'r> + 'r> {
        match self {
            StrategyKind::Greedy { optimal } => Box::new(Greedy::new(base, line_cap, *optimal)),
            StrategyKind::Random => Box::new(RandomWalk::new(base, line_cap)),
            StrategyKind::HillClimb => Box::new(HillClimb::new(base, line_cap, ())),
            StrategyKind::LookAhead(params) => Box::new(LookAhead::new(base, line_cap, *params)),
            StrategyKind::SimulatedAnnealing(params) => {
                Box::new(SimulatedAnnealing::new(base, line_cap, *params))
            }
            StrategyKind::Constructive { heuristic, adjuster } => {
                Box::new(Constructive::new(base, line_cap, heuristic.build(line_cap), *adjuster))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Greedy { optimal: false } => "greedy",
            StrategyKind::Greedy { optimal: true } => "perfectionist",
            StrategyKind::Random => "random",
            StrategyKind::HillClimb => "hill climb",
            StrategyKind::LookAhead(_) => "look ahead",
            StrategyKind::SimulatedAnnealing(_) => "simulated annealing",
            StrategyKind::Constructive { .. } => "constructive",
        }
    }
}

/// The first item with the greatest key. Ties go to whichever came first, so
/// selection follows the order moves are generated in.
pub(crate) fn first_max_by_key<I, K, F>(items: I, key: F) -> Option<I::Item>
where
    I: IntoIterator,
    K: Ord,
    F: FnMut(&I::Item) -> K,
{
    items.into_iter().max_set_by_key(key).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ensures ties resolve to the earliest candidate
    #[test]
    fn test_first_max() {
        let items = [(0, 3), (1, 5), (2, 5), (3, 1)];
        assert_eq!(first_max_by_key(items, |&(_, k)| k), Some((1, 5)));
        assert_eq!(first_max_by_key(Vec::<u8>::new(), |&k| k), None);
    }

    /// Ensures strategy selectors read from TOML with their defaults filled in
    #[test]
    fn test_kind_from_toml() {
        let kind: StrategyKind = toml::from_str("type = \"greedy\"").unwrap();
        assert_eq!(kind, StrategyKind::Greedy { optimal: false });

        let kind: StrategyKind = toml::from_str("type = \"look_ahead\"\ndepth = 2").unwrap();
        assert_eq!(kind, StrategyKind::LookAhead(LookAheadParams { depth: 2, iter_cap: None }));

        let kind: StrategyKind = toml::from_str("type = \"simulated_annealing\"").unwrap();
        assert_eq!(kind, StrategyKind::SimulatedAnnealing(AnnealParams::default()));
        assert_eq!(kind.name(), "simulated annealing");
    }
}
