#![warn(rust_2018_idioms)]

//! Plans train lines over a rail graph so that every segment is covered while as
//! little time as possible is spent on segments that are already served.
//!
//! A [`Runner`](runner::Runner) drives one of several search strategies over a
//! [`Network`](network::Network) of lines, built on an immutable [`Rails`](rails::Rails)
//! graph that is loaded from TOML with [`parse::parse_rails`].

pub mod baseline;
pub mod constructive;
pub mod error;
pub mod localsearch;
pub mod moves;
pub mod network;
pub mod parse;
pub mod rails;
pub mod runner;
pub mod strategy;

#[cfg(test)]
mod test;

pub use network::{Line, Network, NetworkState};
pub use rails::Rails;
pub use runner::{Runner, RunnerConfig, StartPolicy};
pub use strategy::{Strategy, StrategyKind};
