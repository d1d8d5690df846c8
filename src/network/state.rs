//! Canonical snapshots of networks, for spotting revisited states.

use itertools::Itertools;
use ordered_float::OrderedFloat;

use super::Network;
use crate::rails::StationId;

/// A compact, canonical form of a network. Two networks with the same lines compare
/// equal regardless of line order or the direction each line is written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkState {
    lines: Vec<Vec<StationId>>,
    quality: OrderedFloat<f64>,
}

impl NetworkState {
    pub fn from_network(net: &Network<'_>) -> Self {
        let mut lines = net
            .lines()
            .iter()
            .map(|line| {
                let forward = line.stations().collect_vec();
                let backward = line.stations().rev().collect_vec();
                forward.min(backward)
            })
            .collect_vec();
        lines.sort_unstable();
        Self { lines, quality: OrderedFloat(net.quality()) }
    }

    /// The canonical station sequence of every line
    pub fn lines(&self) -> &[Vec<StationId>] {
        &self.lines
    }

    pub fn quality(&self) -> f64 {
        self.quality.into_inner()
    }
}

impl From<&Network<'_>> for NetworkState {
    fn from(net: &Network<'_>) -> Self {
        Self::from_network(net)
    }
}
