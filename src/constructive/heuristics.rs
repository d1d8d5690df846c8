//! Heuristics score a candidate move given the network it would be committed to.

use serde::{Deserialize, Serialize};

use crate::{
    moves::{Extension, Move},
    network::Network,
};

/// Scores a candidate move on a network; higher is more attractive
pub trait Heuristic {
    fn score(&self, net: &Network<'_>, mv: &Move, rng: &mut fastrand::Rng) -> f64;
}

impl<F> Heuristic for F
where
    F: Fn(&Network<'_>, &Move, &mut fastrand::Rng) -> f64,
{
    fn score(&self, net: &Network<'_>, mv: &Move, rng: &mut fastrand::Rng) -> f64 {
        self(net, mv, rng)
    }
}

/// Which heuristic a constructive search uses
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeuristicKind {
    Random,
    Greedy,
    FullLookahead {
        #[serde(default = "default_depth")]
        depth: usize,
        #[serde(default = "default_constructive")]
        constructive: bool,
    },
    BranchBound {
        #[serde(default = "default_depth")]
        depth: usize,
        #[serde(default = "default_constructive")]
        constructive: bool,
    },
    NextFree,
    Perfectionist,
}

fn default_depth() -> usize {
    2
}

fn default_constructive() -> bool {
    true
}

impl HeuristicKind {
    pub fn build(&self, line_cap: usize) -> Box<dyn Heuristic> {
        match *self {
            HeuristicKind::Random => Box::new(Uniform { line_cap }),
            HeuristicKind::Greedy => Box::new(OneStep { line_cap }),
            HeuristicKind::FullLookahead { depth, constructive } => {
                Box::new(FullLookahead { line_cap, depth, constructive })
            }
            HeuristicKind::BranchBound { depth, constructive } => {
                Box::new(BranchBound { line_cap, depth, constructive })
            }
            HeuristicKind::NextFree => Box::new(NextFree { line_cap }),
            HeuristicKind::Perfectionist => Box::new(NoOverlap { line_cap }),
        }
    }
}

/// New lines are worth 1 while under the line cap, and nothing after
fn addition_score(net: &Network<'_>, line_cap: usize) -> f64 {
    if net.lines().len() < line_cap {
        1.0
    } else {
        0.0
    }
}

/// Uniform random scores in `[1, 2)`, except for additions beyond the line cap
#[derive(Debug, Clone, Copy)]
pub struct Uniform {
    pub line_cap: usize,
}

impl Heuristic for Uniform {
    fn score(&self, net: &Network<'_>, mv: &Move, rng: &mut fastrand::Rng) -> f64 {
        match mv {
            Move::Addition(_) if net.lines().len() >= self.line_cap => 0.0,
            _ => rng.f64() + 1.0,
        }
    }
}

/// One move ahead: new segments first, then short ones
#[derive(Debug, Clone, Copy)]
pub struct OneStep {
    pub line_cap: usize,
}

impl Heuristic for OneStep {
    fn score(&self, net: &Network<'_>, mv: &Move, _rng: &mut fastrand::Rng) -> f64 {
        match mv {
            Move::Extension(e) => {
                100.0 * (1.0 + f64::from(u8::from(e.is_new()))) - f64::from(e.duration())
            }
            Move::Addition(_) => addition_score(net, self.line_cap),
            _ => 0.0,
        }
    }
}

/// Commits the candidate on a copy and explores every sequence of `depth` further
/// moves, scoring the best quality found
#[derive(Debug, Clone, Copy)]
pub struct FullLookahead {
    pub line_cap: usize,
    pub depth: usize,
    /// Only explore extensions and additions
    pub constructive: bool,
}

impl FullLookahead {
    fn look(&self, net: &Network<'_>, depth: usize) -> f64 {
        let quality = net.quality();
        if depth < 1 {
            return quality;
        }
        let best = net
            .state_neighbours(self.line_cap, false, self.constructive)
            .map(|n| self.look(&n, depth - 1))
            .reduce(f64::max)
            .unwrap_or(0.0);
        quality.max(best)
    }
}

impl Heuristic for FullLookahead {
    fn score(&self, net: &Network<'_>, mv: &Move, _rng: &mut fastrand::Rng) -> f64 {
        let next = net.neighbour(mv.clone());
        next.state_neighbours(self.line_cap, false, self.constructive)
            .map(|n| self.look(&n, self.depth.saturating_sub(1)))
            .fold(0.0, f64::max)
    }
}

/// Like [`FullLookahead`], but cuts a branch as soon as an optimistic bound on
/// what it could still reach does not beat the best score so far
#[derive(Debug, Clone, Copy)]
pub struct BranchBound {
    pub line_cap: usize,
    pub depth: usize,
    pub constructive: bool,
}

impl BranchBound {
    /// At most one new segment per step, each worth its share of full coverage
    /// minus the quickest possible travel time
    fn bound(net: &Network<'_>, steps: usize, free_util: f64) -> f64 {
        let uncovered = net.rails().segment_count() - net.total_links();
        uncovered.min(steps) as f64 * free_util
    }

    fn branch(&self, net: &Network<'_>, depth: usize, mut highest: f64, free_util: f64) -> f64 {
        if depth == 0 {
            return highest;
        }
        for next in net.state_neighbours(self.line_cap, false, self.constructive) {
            let score = next.quality();
            if score + Self::bound(&next, depth - 1, free_util) <= highest {
                continue;
            }
            highest = highest.max(self.branch(&next, depth - 1, score, free_util));
        }
        highest
    }
}

impl Heuristic for BranchBound {
    fn score(&self, net: &Network<'_>, mv: &Move, _rng: &mut fastrand::Rng) -> f64 {
        let rails = net.rails();
        let free_util = 10_000.0 / rails.segment_count() as f64 - f64::from(rails.shortest());
        let next = net.neighbour(mv.clone());
        let depth = self.depth.saturating_sub(1);
        next.state_neighbours(self.line_cap, false, self.constructive)
            .fold(next.quality(), |highest, n| self.branch(&n, depth, highest, free_util))
    }
}

/// Like [`OneStep`], but among overlapping extensions prefers those ending next
/// to a free segment
#[derive(Debug, Clone, Copy)]
pub struct NextFree {
    pub line_cap: usize,
}

impl NextFree {
    fn tier(net: &Network<'_>, extension: &Extension) -> f64 {
        if extension.is_new() {
            3.0
        } else if net.free_degree(extension.destination()) > 0 {
            2.0
        } else {
            1.0
        }
    }
}

impl Heuristic for NextFree {
    fn score(&self, net: &Network<'_>, mv: &Move, _rng: &mut fastrand::Rng) -> f64 {
        match mv {
            Move::Extension(e) => 100.0 * Self::tier(net, e) - f64::from(e.duration()),
            Move::Addition(_) => addition_score(net, self.line_cap),
            _ => 0.0,
        }
    }
}

/// Only new segments score, so overlap is never chosen
#[derive(Debug, Clone, Copy)]
pub struct NoOverlap {
    pub line_cap: usize,
}

impl Heuristic for NoOverlap {
    fn score(&self, net: &Network<'_>, mv: &Move, _rng: &mut fastrand::Rng) -> f64 {
        match mv {
            Move::Extension(e) if e.is_new() => 100.0 - f64::from(e.duration()),
            Move::Addition(_) => addition_score(net, self.line_cap),
            _ => 0.0,
        }
    }
}
