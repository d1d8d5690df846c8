//! Moves in state space: every edit a search can make to a network.
//!
//! Moves are plain data. They address lines by position and stations and segments by
//! their dense ids, so a move worked out on one network applies unchanged to any clone
//! of it. Fields are private and moves are only handed out by a [`Network`], which keeps
//! a caller from inventing an extension over a segment that does not exist.
//!
//! [`Network`]: crate::network::Network

use crate::{
    network::LineId,
    rails::{SegmentId, StationId},
};

/// Which end of a line a retraction shortens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum End {
    Front,
    Back,
}

/// Grow a line by one segment at the end matching `origin`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Extension {
    pub(crate) new: bool,
    pub(crate) duration: u32,
    pub(crate) line: LineId,
    pub(crate) origin: StationId,
    pub(crate) destination: StationId,
    pub(crate) segment: SegmentId,
}

impl Extension {
    /// Whether the segment was unused when this move was generated
    pub fn is_new(&self) -> bool {
        self.new
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    pub fn origin(&self) -> StationId {
        self.origin
    }

    pub fn destination(&self) -> StationId {
        self.destination
    }

    pub fn segment(&self) -> SegmentId {
        self.segment
    }
}

/// Shorten a line by one segment at one of its ends
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Retraction {
    pub(crate) end: End,
    pub(crate) line: LineId,
}

impl Retraction {
    pub fn end(&self) -> End {
        self.end
    }

    pub fn line(&self) -> LineId {
        self.line
    }
}

/// Delete a line that has no segments left
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Removal {
    pub(crate) line: LineId,
}

impl Removal {
    pub fn line(&self) -> LineId {
        self.line
    }
}

/// Start a new line at a root station
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Addition {
    pub(crate) root: StationId,
}

impl Addition {
    pub fn root(&self) -> StationId {
        self.root
    }
}

/// Any edit to a network. Committing consumes the move.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Move {
    Extension(Extension),
    Retraction(Retraction),
    Removal(Removal),
    Addition(Addition),
}

impl Move {
    /// Whether this move can only grow the network
    pub fn is_constructive(&self) -> bool {
        matches!(self, Move::Extension(_) | Move::Addition(_))
    }

    /// The line this move touches, if it touches an existing one
    pub fn line(&self) -> Option<LineId> {
        match self {
            Move::Extension(e) => Some(e.line),
            Move::Retraction(r) => Some(r.line),
            Move::Removal(r) => Some(r.line),
            Move::Addition(_) => None,
        }
    }
}

impl From<Extension> for Move {
    fn from(extension: Extension) -> Self {
        Move::Extension(extension)
    }
}

impl From<Retraction> for Move {
    fn from(retraction: Retraction) -> Self {
        Move::Retraction(retraction)
    }
}

impl From<Removal> for Move {
    fn from(removal: Removal) -> Self {
        Move::Removal(removal)
    }
}

impl From<Addition> for Move {
    fn from(addition: Addition) -> Self {
        Move::Addition(addition)
    }
}
