//! The solution state: a network of train lines over a rail graph, with the bookkeeping
//! needed to score it incrementally.
//!
//! Every segment has a usage count (how many line traversals run over it) and every
//! station a free degree (how many of its segments no line uses yet). Lines only change
//! through committed [`Move`]s, which keep the counters, the number of covered segments
//! and the overtime spent on already covered segments up to date.

use itertools::Itertools;
use tracing::warn;

use crate::{
    error::MoveError,
    moves::{Addition, End, Extension, Move, Removal, Retraction},
    rails::{Rails, SegmentId, StationId},
};

mod line;
mod state;

pub use line::Line;
pub use state::NetworkState;

/// Position of a line within its network
pub type LineId = usize;

/// A network of train lines built on a rail graph
#[derive(Debug, Clone)]
pub struct Network<'r> {
    rails: &'r Rails,
    max_duration: u32,
    lines: Vec<Line>,
    /// Traversals of every segment, indexed by `SegmentId`
    usage: Vec<u32>,
    /// Unused segments around every station, indexed by `StationId`
    free_degree: Vec<u32>,
    total_links: usize,
    overtime: u64,
}

impl<'r> Network<'r> {
    /// An empty network, where no line may run longer than `max_duration`
    pub fn new(rails: &'r Rails, max_duration: u32) -> Self {
        Self {
            rails,
            max_duration,
            lines: Vec::new(),
            usage: vec![0; rails.segment_count()],
            free_degree: rails.station_ids().map(|s| rails.degree(s) as u32).collect(),
            total_links: 0,
            overtime: 0,
        }
    }

    /// Rebuild a network from a canonical state
    pub fn from_state(
        rails: &'r Rails,
        max_duration: u32,
        state: &NetworkState,
    ) -> Result<Self, MoveError> {
        let mut net = Self::new(rails, max_duration);
        for stations in state.lines() {
            let Some((&root, rest)) = stations.split_first() else { continue };
            let id = net.add_line(root);
            for &station in rest {
                net.extend_line(id, station)?;
            }
        }
        Ok(net)
    }

    pub fn rails(&self) -> &'r Rails {
        self.rails
    }

    pub fn max_duration(&self) -> u32 {
        self.max_duration
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(id)
    }

    /// Number of distinct segments used by at least one line
    pub fn total_links(&self) -> usize {
        self.total_links
    }

    /// Time spent by lines on segments that were already covered
    pub fn overtime(&self) -> u64 {
        self.overtime
    }

    /// How many line traversals use the segment between two stations
    pub fn usage(&self, a: StationId, b: StationId) -> u32 {
        self.rails.segment_between(a, b).map_or(0, |s| self.usage[s.0])
    }

    pub fn segment_usage(&self, segment: SegmentId) -> u32 {
        self.usage[segment.0]
    }

    /// How many segments around a station are not yet used by any line
    pub fn free_degree(&self, station: StationId) -> u32 {
        self.free_degree[station.0]
    }

    /// Start a new line at `root`
    pub fn add_line(&mut self, root: StationId) -> LineId {
        self.lines.push(Line::new(root));
        self.lines.len() - 1
    }

    /// Extend a line from its tail to an adjacent station
    pub fn extend_line(&mut self, id: LineId, destination: StationId) -> Result<(), MoveError> {
        let line = self.lines.get(id).ok_or(MoveError::UnknownLine(id))?;
        let origin = line.tail();
        let segment = self
            .rails
            .segment_between(origin, destination)
            .ok_or(MoveError::MissingSegment { origin, destination })?;
        let extension = Extension {
            new: self.usage[segment.0] == 0,
            duration: self.rails.segment(segment).duration,
            line: id,
            origin,
            destination,
            segment,
        };
        self.commit(extension.into())
    }

    /// All extensions of one line that fit its remaining duration, without stepping
    /// straight back to the station it just came from. The tail end comes first.
    pub fn line_extensions(&self, id: LineId) -> impl Iterator<Item = Extension> + '_ {
        let line = &self.lines[id];
        let ends = if line.is_root() {
            [Some((line.tail(), None)), None]
        } else if line.is_closed() {
            [None, None]
        } else {
            [
                Some((line.tail(), line.behind(End::Back))),
                Some((line.head(), line.behind(End::Front))),
            ]
        };
        let remaining = self.max_duration.saturating_sub(line.duration());
        ends.into_iter().flatten().flat_map(move |(origin, back)| {
            self.rails
                .links(origin)
                .iter()
                .filter(move |link| link.duration <= remaining && Some(link.to) != back)
                .map(move |link| Extension {
                    new: self.usage[link.segment.0] == 0,
                    duration: link.duration,
                    line: id,
                    origin,
                    destination: link.to,
                    segment: link.segment,
                })
        })
    }

    /// All legal extensions, line by line
    pub fn extensions(&self) -> impl Iterator<Item = Extension> + '_ {
        (0..self.lines.len()).flat_map(move |id| self.line_extensions(id))
    }

    /// Retractions of one line: none for a root, only the back for a single segment,
    /// otherwise both ends
    pub fn line_retractions(&self, id: LineId) -> impl Iterator<Item = Retraction> {
        let ends: &'static [End] = match self.lines[id].len() {
            1 => &[],
            2 => &[End::Back],
            _ => &[End::Front, End::Back],
        };
        ends.iter().map(move |&end| Retraction { end, line: id })
    }

    pub fn retractions(&self) -> impl Iterator<Item = Retraction> + '_ {
        (0..self.lines.len()).flat_map(move |id| self.line_retractions(id))
    }

    /// Removals of lines without any segment
    pub fn removals(&self) -> impl Iterator<Item = Removal> + '_ {
        self.lines.iter().positions(Line::is_root).map(|line| Removal { line })
    }

    /// New lines may only start at stations with an unused segment
    pub fn additions(&self) -> impl Iterator<Item = Addition> + '_ {
        self.rails
            .station_ids()
            .filter(move |s| self.free_degree[s.0] > 0)
            .map(|root| Addition { root })
    }

    /// Every legal move: extensions, retractions, removals, then additions if allowed
    pub fn moves(&self, addition: bool) -> impl Iterator<Item = Move> + '_ {
        self.extensions()
            .map(Move::from)
            .chain(self.retractions().map(Move::from))
            .chain(self.removals().map(Move::from))
            .chain(addition.then(|| self.additions().map(Move::from)).into_iter().flatten())
    }

    /// Moves that only grow the network: extensions, then additions if allowed
    pub fn constructions(&self, addition: bool) -> impl Iterator<Item = Move> + '_ {
        self.extensions()
            .map(Move::from)
            .chain(addition.then(|| self.additions().map(Move::from)).into_iter().flatten())
    }

    /// Whether a retraction only drops a segment some other traversal still covers,
    /// which lowers duration without losing coverage
    pub fn is_evident(&self, retraction: &Retraction) -> bool {
        self.lines
            .get(retraction.line)
            .and_then(|line| line.end_segment(retraction.end))
            .is_some_and(|segment| self.usage[segment.0] >= 2)
    }

    pub fn evident_retractions(&self) -> impl Iterator<Item = Retraction> + '_ {
        self.retractions().filter(move |r| self.is_evident(r))
    }

    /// Strip overlapping tails from every line, then drop lines left without a segment.
    /// Returns the number of moves applied.
    pub fn trim(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let next = self.evident_retractions().next();
            let Some(retraction) = next else { break };
            self.apply(retraction.into());
            applied += 1;
        }
        let before = self.lines.len();
        self.lines.retain(|line| !line.is_root());
        applied + before - self.lines.len()
    }

    /// Check a move against this network, then apply it
    pub fn commit(&mut self, mv: Move) -> Result<(), MoveError> {
        if let Err(e) = self.check(&mv) {
            warn!(?mv, "Rejected move: {}", e);
            return Err(e);
        }
        self.apply(mv);
        Ok(())
    }

    /// Whether a move can be applied to this network as it stands
    pub fn check(&self, mv: &Move) -> Result<(), MoveError> {
        match mv {
            Move::Extension(e) => {
                let line = self.lines.get(e.line).ok_or(MoveError::UnknownLine(e.line))?;
                if line.is_closed() {
                    return Err(MoveError::ClosedLine(e.line));
                }
                if e.origin != line.tail() && e.origin != line.head() {
                    return Err(MoveError::DisconnectedExtension { line: e.line, origin: e.origin });
                }
                let end = if e.origin == line.tail() { End::Back } else { End::Front };
                if line.behind(end) == Some(e.destination) {
                    return Err(MoveError::Backtrack { line: e.line, destination: e.destination });
                }
                if self.rails.segment_between(e.origin, e.destination) != Some(e.segment) {
                    return Err(MoveError::MissingSegment {
                        origin: e.origin,
                        destination: e.destination,
                    });
                }
                if line.duration() + self.rails.segment(e.segment).duration > self.max_duration {
                    return Err(MoveError::ExceedsDuration(e.line));
                }
            }
            Move::Retraction(r) => {
                let line = self.lines.get(r.line).ok_or(MoveError::UnknownLine(r.line))?;
                if line.is_root() {
                    return Err(MoveError::NothingToRetract(r.line));
                }
            }
            Move::Removal(r) => {
                let line = self.lines.get(r.line).ok_or(MoveError::UnknownLine(r.line))?;
                if !line.is_root() {
                    return Err(MoveError::LineNotEmpty(r.line));
                }
            }
            Move::Addition(a) => {
                if a.root.0 >= self.rails.station_count() {
                    return Err(MoveError::UnknownStation(a.root));
                }
            }
        }
        Ok(())
    }

    /// Apply a move generated from this network, or from a network it was cloned from
    /// that has not diverged since.
    pub(crate) fn apply(&mut self, mv: Move) {
        match mv {
            Move::Extension(e) => self.extend(e),
            Move::Retraction(r) => self.retract(r),
            Move::Removal(r) => {
                self.lines.remove(r.line);
            }
            Move::Addition(a) => {
                self.add_line(a.root);
            }
        }
    }

    fn extend(&mut self, extension: Extension) {
        let segment = self.rails.segment(extension.segment);
        let usage = &mut self.usage[extension.segment.0];
        if *usage == 0 {
            self.total_links += 1;
            self.free_degree[segment.a.0] -= 1;
            self.free_degree[segment.b.0] -= 1;
        } else {
            self.overtime += u64::from(segment.duration);
        }
        *usage += 1;

        let line = &mut self.lines[extension.line];
        let end = if extension.origin == line.tail() { End::Back } else { End::Front };
        line.push(end, extension.destination, extension.segment, segment.duration);
    }

    fn retract(&mut self, retraction: Retraction) {
        let Some(id) = self.lines[retraction.line].pop(retraction.end, self.rails) else {
            return;
        };
        let segment = self.rails.segment(id);
        let usage = &mut self.usage[id.0];
        *usage -= 1;
        if *usage == 0 {
            self.total_links -= 1;
            self.free_degree[segment.a.0] += 1;
            self.free_degree[segment.b.0] += 1;
        } else {
            self.overtime -= u64::from(segment.duration);
        }
    }

    /// A copy of this network with one move applied
    pub fn neighbour(&self, mv: Move) -> Network<'r> {
        let mut net = self.clone();
        net.apply(mv);
        net
    }

    /// Every network one legal move away, lazily cloned. New lines are only considered
    /// while under `line_cap`; `constructive` restricts the moves to extensions and
    /// additions; `stationary` also yields an unchanged copy at the end.
    pub fn state_neighbours(
        &self,
        line_cap: usize,
        stationary: bool,
        constructive: bool,
    ) -> impl Iterator<Item = Network<'r>> + '_ {
        let addition = self.lines.len() < line_cap;
        let moves = if constructive {
            self.constructions(addition).collect_vec()
        } else {
            self.moves(addition).collect_vec()
        };
        moves
            .into_iter()
            .map(move |mv| self.neighbour(mv))
            .chain(stationary.then(|| self.clone()))
    }

    /// Fraction of segments covered by at least one line
    pub fn coverage(&self) -> f64 {
        self.total_links as f64 / self.rails.segment_count() as f64
    }

    pub fn fully_covered(&self) -> bool {
        self.total_links == self.rails.segment_count()
    }

    /// Total duration of all lines, in minutes
    pub fn total_duration(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.duration())).sum()
    }

    /// `Q = coverage * 10_000 - (lines * 100 + total_duration)`
    pub fn quality(&self) -> f64 {
        let cost = self.lines.len() as f64 * 100.0 + self.total_duration() as f64;
        self.coverage() * 10_000.0 - cost
    }

    /// Fully covered without running any segment twice
    pub fn is_optimal(&self) -> bool {
        self.overtime == 0 && self.fully_covered()
    }

    pub fn state(&self) -> NetworkState {
        NetworkState::from_network(self)
    }

    /// The network as `train,stations` rows followed by its score
    pub fn to_output(&self) -> String {
        let rows = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("train_{},{}\n", i, line.output(self.rails)))
            .join("");
        format!("train,stations\n{}score,{}", rows, self.quality())
    }
}
