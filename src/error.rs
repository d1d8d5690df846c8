//! Error types for building rail graphs, configuring runs, reading
//! exported solutions and committing moves.

use std::fmt;

use crate::{network::LineId, rails::StationId};

/// Raised when a rail description does not form a valid graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RailsError {
    /// Two stations share a name
    DuplicateStation(String),
    /// A connection names a station that was never declared
    UnknownStation(String),
    /// A connection was declared twice
    DuplicateSegment(String, String),
    /// A connection starts and ends at the same station
    SelfLoop(String),
    /// A connection has a zero duration
    ZeroDuration(String, String),
    /// An edit names a segment the graph does not have
    MissingSegment(String, String),
    /// The graph has no segments left to cover
    NoSegments,
}

impl fmt::Display for RailsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RailsError::DuplicateStation(name) => write!(f, "Station '{}' is declared twice", name),
            RailsError::UnknownStation(name) => write!(f, "Station '{}' is not declared", name),
            RailsError::DuplicateSegment(a, b) => {
                write!(f, "The segment between '{}' and '{}' is declared twice", a, b)
            }
            RailsError::SelfLoop(name) => write!(f, "Station '{}' is connected to itself", name),
            RailsError::ZeroDuration(a, b) => {
                write!(f, "The segment between '{}' and '{}' has no duration", a, b)
            }
            RailsError::MissingSegment(a, b) => {
                write!(f, "There is no segment between '{}' and '{}'", a, b)
            }
            RailsError::NoSegments => write!(f, "The rail graph has no segments"),
        }
    }
}

impl std::error::Error for RailsError {}

/// Raised when a run configuration cannot be used on the given graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The start policy name is not recognised
    UnknownStartPolicy(String),
    /// More roots are requested than there are stations to host them
    LineCapExceedsStations { line_cap: usize, stations: usize },
    /// The line cap is zero, so no line could ever be built
    ZeroLineCap,
    /// The per-line duration cap is zero
    ZeroDuration,
    /// An annealing schedule or iteration cap that makes the temperature non-positive
    InvalidAnnealing(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownStartPolicy(name) => write!(
                f,
                "Unknown start policy '{}', expected one of \
                 clean, random, greedy, random_roots, odd_roots",
                name
            ),
            ConfigError::LineCapExceedsStations { line_cap, stations } => write!(
                f,
                "A line cap of {} exceeds the {} stations that can host a root",
                line_cap, stations
            ),
            ConfigError::ZeroLineCap => write!(f, "The line cap must be at least 1"),
            ConfigError::ZeroDuration => write!(f, "The maximum line duration must be at least 1"),
            ConfigError::InvalidAnnealing(reason) => {
                write!(f, "Invalid annealing parameters: {}", reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Raised when an exported solution cannot be read back onto a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    /// The `train,stations` header is missing
    MissingHeader,
    /// A row is not of the form `train_i,"[A, B, ...]"`
    MalformedRow(usize),
    /// A row names a station the graph does not know
    UnknownStation(String),
    /// Two consecutive stations of a line are not connected, or the line
    /// exceeds its duration cap
    InvalidLine { row: usize, source: MoveError },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::MissingHeader => write!(f, "Missing 'train,stations' header"),
            OutputError::MalformedRow(row) => write!(f, "Row {} is malformed", row),
            OutputError::UnknownStation(name) => {
                write!(f, "Station '{}' is not part of the graph", name)
            }
            OutputError::InvalidLine { row, source } => {
                write!(f, "Row {} is not a valid line: {}", row, source)
            }
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::InvalidLine { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Raised when a move no longer fits the network it is committed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// The target line does not exist in this network
    UnknownLine(LineId),
    /// The origin of an extension is neither end of its line
    DisconnectedExtension { line: LineId, origin: StationId },
    /// The stations of an extension are not joined by the expected segment
    MissingSegment { origin: StationId, destination: StationId },
    /// The extension would run straight back over the segment the line just took
    Backtrack { line: LineId, destination: StationId },
    /// The line is a closed loop and cannot grow any further
    ClosedLine(LineId),
    /// The extension would push the line past its duration cap
    ExceedsDuration(LineId),
    /// A retraction targets a line with a single station
    NothingToRetract(LineId),
    /// A removal targets a line that still has segments
    LineNotEmpty(LineId),
    /// An addition targets a station that does not exist
    UnknownStation(StationId),
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::UnknownLine(line) => write!(f, "Line {} does not exist", line),
            MoveError::DisconnectedExtension { line, origin } => {
                write!(f, "Station {} is not an end of line {}", origin, line)
            }
            MoveError::MissingSegment { origin, destination } => {
                write!(f, "There is no segment between stations {} and {}", origin, destination)
            }
            MoveError::Backtrack { line, destination } => {
                write!(f, "Line {} would turn straight back to station {}", line, destination)
            }
            MoveError::ClosedLine(line) => write!(f, "Line {} is a closed loop", line),
            MoveError::ExceedsDuration(line) => {
                write!(f, "Line {} would exceed its duration cap", line)
            }
            MoveError::NothingToRetract(line) => {
                write!(f, "Line {} has no segment to retract", line)
            }
            MoveError::LineNotEmpty(line) => write!(f, "Line {} still has segments", line),
            MoveError::UnknownStation(station) => write!(f, "Station {} does not exist", station),
        }
    }
}

impl std::error::Error for MoveError {}

/// Raised when a graph or configuration file cannot be loaded or saved
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Serialize(toml::ser::Error),
    Rails(RailsError),
    Config(ConfigError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "{}", e),
            LoadError::Toml(e) => write!(f, "{}", e),
            LoadError::Serialize(e) => write!(f, "{}", e),
            LoadError::Rails(e) => write!(f, "{}", e),
            LoadError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Toml(e) => Some(e),
            LoadError::Serialize(e) => Some(e),
            LoadError::Rails(e) => Some(e),
            LoadError::Config(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<toml::de::Error> for LoadError {
    fn from(err: toml::de::Error) -> Self {
        LoadError::Toml(err)
    }
}

impl From<toml::ser::Error> for LoadError {
    fn from(err: toml::ser::Error) -> Self {
        LoadError::Serialize(err)
    }
}

impl From<RailsError> for LoadError {
    fn from(err: RailsError) -> Self {
        LoadError::Rails(err)
    }
}

impl From<ConfigError> for LoadError {
    fn from(err: ConfigError) -> Self {
        LoadError::Config(err)
    }
}
