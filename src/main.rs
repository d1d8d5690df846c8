#![warn(rust_2018_idioms)]

use std::{env, error::Error, process};

use jemallocator::Jemalloc;
use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};
use train_lines::{
    parse::{parse_config, parse_rails},
    Runner, RunnerConfig,
};

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

const USAGE: &str = "usage: train-lines <rails.toml> [config.toml] [runs]";

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT | FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    enable_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(rails_path) = args.first() else {
        eprintln!("{}", USAGE);
        process::exit(2);
    };
    let rails = parse_rails(rails_path)?;
    let config = match args.get(1) {
        Some(path) => parse_config(path)?,
        None => RunnerConfig::standard_greedy(),
    };
    let runs: usize = match args.get(2) {
        Some(runs) => runs.parse()?,
        None => 1,
    };
    info!(
        stations = rails.station_count(),
        segments = rails.segment_count(),
        strategy = config.strategy.name(),
        start = %config.start,
        "Loaded {}",
        rails_path
    );

    let runner = Runner::new(&rails, config)?;
    let network = if runs > 1 {
        runner.best(runs).ok_or("no runs were made")?
    } else {
        runner.run()
    };
    println!("{}", network.to_output());
    Ok(())
}
