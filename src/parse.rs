//! Reads rail graphs and run configurations from TOML files, and reads exported
//! networks back onto a graph

use std::{fs, path::Path};

use crate::{
    error::{LoadError, OutputError},
    network::Network,
    rails::{RailDescription, Rails},
    runner::RunnerConfig,
};

/// Reads a rail graph from a file, in TOML format
pub fn parse_rails(file_name: impl AsRef<Path>) -> Result<Rails, LoadError> {
    let file_contents = fs::read_to_string(file_name)?;
    rails_from_str(&file_contents)
}

pub fn rails_from_str(text: &str) -> Result<Rails, LoadError> {
    let description: RailDescription = toml::from_str(text)?;
    Ok(Rails::new(description)?)
}

/// Saves a rail graph in TOML format to a file
pub fn save_rails(file_name: impl AsRef<Path>, rails: &Rails) -> Result<(), LoadError> {
    fs::write(file_name, toml::to_string(rails.description())?)?;
    Ok(())
}

/// Reads a run configuration from a file, in TOML format. Checking it against a
/// graph is left to [`Runner::new`](crate::runner::Runner::new).
pub fn parse_config(file_name: impl AsRef<Path>) -> Result<RunnerConfig, LoadError> {
    let file_contents = fs::read_to_string(file_name)?;
    Ok(toml::from_str(&file_contents)?)
}

const HEADER: &str = "train,stations";

/// Rebuild a network from the text written by [`Network::to_output`]. The score
/// row is optional and ignored, since quality follows from the lines.
pub fn network_from_output<'r>(
    text: &str,
    rails: &'r Rails,
    max_duration: u32,
) -> Result<Network<'r>, OutputError> {
    let mut rows = text.lines().enumerate();
    match rows.next() {
        Some((_, header)) if header.trim() == HEADER => {}
        _ => return Err(OutputError::MissingHeader),
    }

    let mut net = Network::new(rails, max_duration);
    for (row, line) in rows {
        let line = line.trim();
        if line.is_empty() || line.starts_with("score,") {
            continue;
        }
        let stations = line
            .split_once(',')
            .and_then(|(_, rest)| rest.strip_prefix("\"[")?.strip_suffix("]\""))
            .filter(|inner| !inner.is_empty())
            .ok_or(OutputError::MalformedRow(row))?;

        let mut ids = stations.split(", ").map(|name| {
            rails
                .id_of(name.trim())
                .ok_or_else(|| OutputError::UnknownStation(name.trim().to_owned()))
        });
        let Some(root) = ids.next() else {
            return Err(OutputError::MalformedRow(row));
        };
        let id = net.add_line(root?);
        for station in ids {
            net.extend_line(id, station?)
                .map_err(|source| OutputError::InvalidLine { row, source })?;
        }
    }
    Ok(net)
}
