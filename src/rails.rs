//! This module contains the rail infrastructure the solver plans on: the `RailDescription`,
//! which is what gets stored on disk, and `Rails`, the immutable graph built from it.
//!
//! Editing operations never touch a graph in place. They edit a copy of the description
//! and build a new `Rails`, so a graph shared by running searches stays untouched.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use itertools::Itertools;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::RailsError;

/// Dense index of a station within its `Rails`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationId(pub(crate) usize);

impl StationId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dense index of a segment within its `Rails`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub(crate) usize);

impl SegmentId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single station, with its position
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Station {
    pub name: String,
    /// Northing
    pub n: f64,
    /// Easting
    pub e: f64,
}

/// A timed rail segment between two named stations
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub a: String,
    pub b: String,
    /// Travel time in minutes, in either direction
    pub duration: u32,
}

/// A description of a rail graph, as stored in TOML
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct RailDescription {
    pub stations: Vec<Station>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// One entry of a station's adjacency list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub to: StationId,
    pub duration: u32,
    pub segment: SegmentId,
}

/// An undirected segment, with its endpoints in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub a: StationId,
    pub b: StationId,
    pub duration: u32,
}

/// The full rail graph, with its description and cached lookup structures
#[derive(Debug, Clone)]
pub struct Rails {
    description: RailDescription,
    names: HashMap<String, StationId>,
    /// Neighbours of every station, in the order the connections were declared
    adjacency: Vec<Vec<Link>>,
    segments: Vec<Segment>,
    /// A symmetric matrix of the segment joining two stations, if any
    lookup: Array2<Option<SegmentId>>,
}

impl Rails {
    /// Build a graph from its description, checking it is well formed
    pub fn new(description: RailDescription) -> Result<Self, RailsError> {
        let n = description.stations.len();
        let mut names = HashMap::with_capacity(n);
        for (i, station) in description.stations.iter().enumerate() {
            if names.insert(station.name.clone(), StationId(i)).is_some() {
                return Err(RailsError::DuplicateStation(station.name.clone()));
            }
        }

        let mut adjacency = vec![Vec::new(); n];
        let mut segments = Vec::with_capacity(description.connections.len());
        let mut lookup = Array2::from_elem((n, n), None);
        for connection in &description.connections {
            let a = *names
                .get(&connection.a)
                .ok_or_else(|| RailsError::UnknownStation(connection.a.clone()))?;
            let b = *names
                .get(&connection.b)
                .ok_or_else(|| RailsError::UnknownStation(connection.b.clone()))?;
            if a == b {
                return Err(RailsError::SelfLoop(connection.a.clone()));
            }
            if connection.duration == 0 {
                return Err(RailsError::ZeroDuration(connection.a.clone(), connection.b.clone()));
            }
            if lookup[[a.0, b.0]].is_some() {
                return Err(RailsError::DuplicateSegment(
                    connection.a.clone(),
                    connection.b.clone(),
                ));
            }
            let segment = SegmentId(segments.len());
            let duration = connection.duration;
            segments.push(Segment { a, b, duration });
            lookup[[a.0, b.0]] = Some(segment);
            lookup[[b.0, a.0]] = Some(segment);
            adjacency[a.0].push(Link { to: b, duration, segment });
            adjacency[b.0].push(Link { to: a, duration, segment });
        }
        if segments.is_empty() {
            return Err(RailsError::NoSegments);
        }

        Ok(Self { description, names, adjacency, segments, lookup })
    }

    pub fn description(&self) -> &RailDescription {
        &self.description
    }

    pub fn station_count(&self) -> usize {
        self.description.stations.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// All station ids, in declaration order
    pub fn station_ids(&self) -> impl ExactSizeIterator<Item = StationId> {
        (0..self.station_count()).map(StationId)
    }

    pub fn stations(&self) -> &[Station] {
        &self.description.stations
    }

    pub fn station(&self, id: StationId) -> &Station {
        &self.description.stations[id.0]
    }

    pub fn name(&self, id: StationId) -> &str {
        &self.station(id).name
    }

    /// Look a station up by name
    pub fn id_of(&self, name: &str) -> Option<StationId> {
        self.names.get(name).copied()
    }

    /// The segments leaving a station
    pub fn links(&self, id: StationId) -> &[Link] {
        &self.adjacency[id.0]
    }

    pub fn degree(&self, id: StationId) -> usize {
        self.adjacency[id.0].len()
    }

    pub fn segment(&self, id: SegmentId) -> Segment {
        self.segments[id.0]
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment joining two stations, if they are adjacent
    pub fn segment_between(&self, a: StationId, b: StationId) -> Option<SegmentId> {
        self.lookup.get([a.0, b.0]).copied().flatten()
    }

    /// Duration of the quickest segment
    pub fn shortest(&self) -> u32 {
        self.segments.iter().map(|s| s.duration).min().unwrap_or(0)
    }

    /// Duration of the slowest segment
    pub fn longest(&self) -> u32 {
        self.segments.iter().map(|s| s.duration).max().unwrap_or(0)
    }

    /// Stations that have at least one segment, and so can root a line
    pub fn connected_stations(&self) -> usize {
        self.adjacency.iter().filter(|links| !links.is_empty()).count()
    }

    /// A copy of this graph with `count` new segments between random pairs of
    /// stations that were not yet adjacent. Durations are drawn uniformly between
    /// the shortest and longest existing segment.
    pub fn with_added_segments(
        &self,
        count: usize,
        rng: &mut fastrand::Rng,
    ) -> Result<Rails, RailsError> {
        let mut description = self.description.clone();
        let mut candidates = (0..self.station_count())
            .tuple_combinations()
            .filter(|&(a, b)| self.lookup[[a, b]].is_none())
            .collect_vec();
        rng.shuffle(&mut candidates);
        let (shortest, longest) = (self.shortest(), self.longest());
        for (a, b) in candidates.into_iter().take(count) {
            description.connections.push(Connection {
                a: self.name(StationId(a)).to_owned(),
                b: self.name(StationId(b)).to_owned(),
                duration: rng.u32(shortest..=longest),
            });
        }
        Rails::new(description)
    }

    /// A copy of this graph with `count` random segments removed
    pub fn with_dropped_segments(
        &self,
        count: usize,
        rng: &mut fastrand::Rng,
    ) -> Result<Rails, RailsError> {
        let mut order = (0..self.description.connections.len()).collect_vec();
        rng.shuffle(&mut order);
        let dropped: HashSet<usize> = order.into_iter().take(count).collect();
        let mut description = self.description.clone();
        description.connections = description
            .connections
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !dropped.contains(i))
            .map(|(_, c)| c)
            .collect();
        Rails::new(description)
    }

    /// A copy of this graph without the segments between the given station pairs
    pub fn without_segments(&self, pairs: &[(&str, &str)]) -> Result<Rails, RailsError> {
        let mut description = self.description.clone();
        for &(a, b) in pairs {
            let ia = self.id_of(a).ok_or_else(|| RailsError::UnknownStation(a.to_owned()))?;
            let ib = self.id_of(b).ok_or_else(|| RailsError::UnknownStation(b.to_owned()))?;
            if self.segment_between(ia, ib).is_none() {
                return Err(RailsError::MissingSegment(a.to_owned(), b.to_owned()));
            }
            description.connections.retain(|c| !joins(c, a, b));
        }
        Rails::new(description)
    }

    /// A copy of this graph without the given stations and every segment touching them
    pub fn without_stations(&self, names: &[&str]) -> Result<Rails, RailsError> {
        for &name in names {
            if self.id_of(name).is_none() {
                return Err(RailsError::UnknownStation(name.to_owned()));
            }
        }
        let mut description = self.description.clone();
        description.stations.retain(|s| !names.contains(&s.name.as_str()));
        description
            .connections
            .retain(|c| !names.contains(&c.a.as_str()) && !names.contains(&c.b.as_str()));
        Rails::new(description)
    }

    /// A copy of this graph where one endpoint of the segment between `a` and `b`
    /// has moved to a random station it was not yet adjacent to. The duration is kept.
    /// If no such station exists the copy is unchanged.
    pub fn with_swapped_segment(
        &self,
        a: &str,
        b: &str,
        rng: &mut fastrand::Rng,
    ) -> Result<Rails, RailsError> {
        let ia = self.id_of(a).ok_or_else(|| RailsError::UnknownStation(a.to_owned()))?;
        let ib = self.id_of(b).ok_or_else(|| RailsError::UnknownStation(b.to_owned()))?;
        if self.segment_between(ia, ib).is_none() {
            return Err(RailsError::MissingSegment(a.to_owned(), b.to_owned()));
        }
        let kept = if rng.bool() { ia } else { ib };
        let targets = self
            .station_ids()
            .filter(|&s| s != kept && self.segment_between(kept, s).is_none())
            .collect_vec();
        let Some(target) = rng.choice(targets) else {
            return Ok(self.clone());
        };

        let mut description = self.description.clone();
        for connection in description.connections.iter_mut().filter(|c| joins(c, a, b)) {
            connection.a = self.name(kept).to_owned();
            connection.b = self.name(target).to_owned();
        }
        Rails::new(description)
    }

    /// Swap an endpoint of a random segment, see [`Rails::with_swapped_segment`]
    pub fn with_random_swap(&self, rng: &mut fastrand::Rng) -> Result<Rails, RailsError> {
        let segment = self.segments[rng.usize(..self.segments.len())];
        self.with_swapped_segment(self.name(segment.a), self.name(segment.b), rng)
    }
}

/// Whether a connection joins the two named stations, in either direction
fn joins(connection: &Connection, a: &str, b: &str) -> bool {
    (connection.a == a && connection.b == b) || (connection.a == b && connection.b == a)
}
