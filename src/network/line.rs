//! A single train line: a path of stations that only grows or shrinks at its ends.

use std::collections::VecDeque;

use itertools::Itertools;

use crate::{
    moves::End,
    rails::{Rails, SegmentId, StationId},
};

/// An ordered, double ended path through the rail graph.
/// A line always has at least one station; with exactly one it is a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    stations: VecDeque<StationId>,
    /// `segments[i]` joins `stations[i]` and `stations[i + 1]`
    segments: VecDeque<SegmentId>,
    duration: u32,
}

impl Line {
    pub(crate) fn new(root: StationId) -> Self {
        Self { stations: VecDeque::from([root]), segments: VecDeque::new(), duration: 0 }
    }

    pub fn stations(&self) -> impl DoubleEndedIterator<Item = StationId> + ExactSizeIterator + '_ {
        self.stations.iter().copied()
    }

    pub fn segments(&self) -> impl DoubleEndedIterator<Item = SegmentId> + ExactSizeIterator + '_ {
        self.segments.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether the line is a root, without any segment yet
    pub fn is_root(&self) -> bool {
        self.stations.len() == 1
    }

    /// Total travel time of the line, in minutes
    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn head(&self) -> StationId {
        self.stations[0]
    }

    pub fn tail(&self) -> StationId {
        self.stations[self.stations.len() - 1]
    }

    pub fn end(&self, end: End) -> StationId {
        match end {
            End::Front => self.head(),
            End::Back => self.tail(),
        }
    }

    /// The station next to an end, if the line has more than one station
    pub fn behind(&self, end: End) -> Option<StationId> {
        match end {
            End::Front => self.stations.get(1).copied(),
            End::Back => self.stations.len().checked_sub(2).map(|i| self.stations[i]),
        }
    }

    /// The segment at an end, if the line has one
    pub fn end_segment(&self, end: End) -> Option<SegmentId> {
        match end {
            End::Front => self.segments.front().copied(),
            End::Back => self.segments.back().copied(),
        }
    }

    /// Whether both ends meet, which stops the line from growing any further
    pub fn is_closed(&self) -> bool {
        self.stations.len() > 1 && self.head() == self.tail()
    }

    pub(crate) fn push(&mut self, end: End, station: StationId, segment: SegmentId, duration: u32) {
        match end {
            End::Front => {
                self.stations.push_front(station);
                self.segments.push_front(segment);
            }
            End::Back => {
                self.stations.push_back(station);
                self.segments.push_back(segment);
            }
        }
        self.duration += duration;
    }

    /// Remove the station and segment at an end, returning the segment
    pub(crate) fn pop(&mut self, end: End, rails: &Rails) -> Option<SegmentId> {
        if self.is_root() {
            return None;
        }
        let segment = match end {
            End::Front => {
                self.stations.pop_front();
                self.segments.pop_front()
            }
            End::Back => {
                self.stations.pop_back();
                self.segments.pop_back()
            }
        }?;
        self.duration -= rails.segment(segment).duration;
        Some(segment)
    }

    /// The station names of this line, as `"[A, B, C]"`
    pub fn output(&self, rails: &Rails) -> String {
        format!("\"[{}]\"", self.stations.iter().map(|&s| rails.name(s)).join(", "))
    }
}
