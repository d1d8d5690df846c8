use std::fs;

use proptest::prelude::*;

use crate::{
    constructive::adjusters::{soft_n, Adjuster},
    localsearch::metaheuristic::acceptance_probability,
    moves::{End, Move},
    network::Network,
    parse::{network_from_output, parse_config, parse_rails, save_rails},
    rails::{fixtures::{lattice, square}, Rails},
    runner::{Runner, RunnerConfig},
    strategy::StrategyKind,
};

/// Commit `steps` random legal moves, never holding more than `line_cap` lines
fn random_moves<'r>(
    net: &mut Network<'r>,
    steps: usize,
    line_cap: usize,
    rng: &mut fastrand::Rng,
) -> Vec<Move> {
    let mut applied = Vec::new();
    for _ in 0..steps {
        let moves: Vec<Move> = net.moves(net.lines().len() < line_cap).collect();
        let Some(mv) = rng.choice(moves) else { break };
        net.commit(mv.clone()).unwrap();
        applied.push(mv);
    }
    applied
}

fn used_segments(net: &Network<'_>) -> usize {
    net.rails().segments().iter().filter(|s| net.usage(s.a, s.b) > 0).count()
}

/// Ensures a greedy search on a four station cycle with a single line runs the whole
/// loop and returns to where it started
#[test]
fn test_greedy_cycle() {
    let rails = square();
    for seed in 0..8 {
        let config = RunnerConfig::new(StrategyKind::Greedy { optimal: false })
            .with_max_duration(100)
            .with_line_cap(1);
        let runner = Runner::new(&rails, config).unwrap();
        let net = runner.run_with(&mut fastrand::Rng::with_seed(seed));
        assert_eq!(net.coverage(), 1.0, "Ensure every segment is covered");
        assert_eq!(net.lines().len(), 1);
        let line = &net.lines()[0];
        assert_eq!(line.len(), 5, "Ensure the line visits all four stations and closes");
        assert_eq!(line.head(), line.tail());
        // Closing the loop covers the last free segment, so nothing is run twice
        assert_eq!(net.overtime(), 0);
        assert_eq!(net.total_duration(), 40);
    }
}

/// Ensures two lines that may each run only half the cycle split it between them,
/// covering every segment exactly once
#[test]
fn test_optimal_two_lines() {
    let rails = square();
    for seed in 0..8 {
        let config = RunnerConfig::new(StrategyKind::Greedy { optimal: true })
            .with_max_duration(20)
            .with_line_cap(2);
        let runner = Runner::new(&rails, config).unwrap();
        let net = runner.run_with(&mut fastrand::Rng::with_seed(seed));
        assert!(net.is_optimal());
        assert_eq!(net.overtime(), 0);
        assert_eq!(net.coverage(), 1.0);
        assert_eq!(net.lines().len(), 2);
        assert!(
            net.lines().iter().all(|l| l.len() == 3),
            "Ensure both lines carry two segments"
        );
    }

    let mut net = Network::new(&rails, 100);
    let id = |name| rails.id_of(name).unwrap();
    for stations in [["A", "B", "C"], ["C", "D", "A"]] {
        let line = net.add_line(id(stations[0]));
        for &station in &stations[1..] {
            net.extend_line(line, id(station)).unwrap();
        }
    }
    assert!(net.is_optimal());
    assert_eq!(net.quality(), 10_000.0 - 200.0 - 40.0);
}

/// Ensures the top-n softmax falls back to a hard argmax on ties and on spreads
/// that would overflow
#[test]
fn test_soft_n_fallbacks() {
    assert_eq!(soft_n(&[5.0, 5.0, 1.0], 1), vec![0.5, 0.5, 0.0]);
    assert_eq!(soft_n(&[500.0, 1.0, 1.0], 1), vec![1.0, 0.0, 0.0]);
    assert_eq!(Adjuster::SoftN { n: 1 }.adjust(&[5.0, 5.0, 1.0]), vec![0.5, 0.5, 0.0]);
}

/// Ensures rail graphs survive being written to and read back from disk
#[test]
fn test_rails_serde() {
    let rails = lattice();
    let path = std::env::temp_dir().join(format!("__test_rails_{}.toml", std::process::id()));
    save_rails(&path, &rails).unwrap();
    let read = parse_rails(&path).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(
        read.description(),
        rails.description(),
        "Ensure rail data (de)serialises consistently"
    );
    assert_eq!(read.segment_count(), rails.segment_count());
    assert!(parse_rails(&path).is_err(), "Ensure a missing file is reported");
}

/// Ensures a configuration file drives a runner end to end
#[test]
fn test_config_file() {
    let path = std::env::temp_dir().join(format!("__test_config_{}.toml", std::process::id()));
    fs::write(
        &path,
        r#"
        start = "greedy"
        line_cap = 3
        max_duration = 120
        seed = 11

        [strategy]
        type = "simulated_annealing"
        iter_cap = 50
        "#,
    )
    .unwrap();
    let config = parse_config(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let rails = lattice();
    let runner = Runner::new(&rails, config).unwrap();
    assert_eq!(runner.name(), "simulated annealing");
    let net = runner.runs(Some(1)).next().unwrap();
    assert!(net.lines().len() <= 3);
    assert!(net.lines().iter().all(|l| l.duration() <= 120));
}

/// Ensures an exported run reads back as the same network
#[test]
fn test_export_round_trip() {
    let rails = lattice();
    let config = RunnerConfig::standard_hill_climb().with_line_cap(4).with_seed(5);
    let net = Runner::new(&rails, config).unwrap().runs(Some(1)).next().unwrap();
    let read = network_from_output(&net.to_output(), &rails, net.max_duration()).unwrap();
    assert_eq!(read.state(), net.state());
    assert_eq!(read.overtime(), net.overtime());
    assert_eq!(read.total_links(), net.total_links());
}

/// Ensures trimming a finished run never loses coverage
#[test]
fn test_trim_keeps_coverage() {
    let rails = lattice();
    for seed in 0..6 {
        let config = RunnerConfig::new(StrategyKind::Random).with_line_cap(5).with_seed(seed);
        let raw = Runner::new(&rails, config.clone()).unwrap().runs(Some(1)).next().unwrap();
        let trimmed = Runner::new(&rails, config.with_trim(true))
            .unwrap()
            .runs(Some(1))
            .next()
            .unwrap();
        assert_eq!(trimmed.total_links(), raw.total_links());
        assert!(trimmed.quality() >= raw.quality());
        assert_eq!(trimmed.evident_retractions().count(), 0);
    }
}

/// Ensures the graph edits keep the result usable by a runner
#[test]
fn test_edited_rails() {
    let rails = lattice();
    let mut rng = fastrand::Rng::with_seed(9);
    let edited: Rails = rails
        .with_added_segments(2, &mut rng)
        .and_then(|r| r.with_random_swap(&mut rng))
        .and_then(|r| r.without_stations(&["Den Helder"]))
        .unwrap();
    assert_eq!(edited.station_count(), 7);
    assert_eq!(edited.stations().len(), 7);
    let runner = Runner::new(&edited, RunnerConfig::standard_greedy().with_line_cap(3)).unwrap();
    let net = runner.run();
    assert!(net.lines().len() <= 3);
}

proptest! {
    /// Ensures candidates at least as good as the current network are always accepted
    #[test]
    fn prop_acceptance_of_improvements(
        current in -10_000.0f64..10_000.0,
        gain in 0.0f64..10_000.0,
        temperature in 0.001f64..1_000.0,
    ) {
        prop_assert_eq!(acceptance_probability(current, current + gain, temperature), 1.0);
    }

    /// Ensures the usage and coverage bookkeeping stays consistent under any sequence
    /// of legal moves
    #[test]
    fn prop_bookkeeping(seed in any::<u64>(), steps in 0usize..60, line_cap in 1usize..5) {
        let rails = lattice();
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut net = Network::new(&rails, 90);
        random_moves(&mut net, steps, line_cap, &mut rng);

        for a in rails.station_ids() {
            for b in rails.station_ids() {
                prop_assert_eq!(net.usage(a, b), net.usage(b, a));
            }
        }
        prop_assert_eq!(net.total_links(), used_segments(&net));
        prop_assert_eq!(net.coverage(), net.total_links() as f64 / rails.segment_count() as f64);
        prop_assert!(net.lines().len() <= line_cap);
        prop_assert!(net.lines().iter().all(|l| l.duration() <= 90));
        let traversals: u32 = net.lines().iter().map(|l| l.len() as u32 - 1).sum();
        let usage: u32 = rails.segments().iter().map(|s| net.usage(s.a, s.b)).sum();
        prop_assert_eq!(traversals, usage);
    }

    /// Ensures retracting a fresh extension restores the network exactly
    #[test]
    fn prop_extension_round_trip(seed in any::<u64>(), steps in 0usize..30) {
        let rails = lattice();
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut net = Network::new(&rails, 120);
        random_moves(&mut net, steps, 3, &mut rng);
        if net.lines().is_empty() {
            net.add_line(rails.id_of("Purmerend").unwrap());
        }

        let extensions: Vec<_> = net.extensions().collect();
        if let Some(extension) = rng.choice(extensions) {
            let id = extension.line();
            let line = net.line(id).unwrap();
            let end = if extension.origin() == line.tail() { End::Back } else { End::Front };
            let (a, b) = (extension.origin(), extension.destination());

            let mut next = net.clone();
            next.commit(extension.clone().into()).unwrap();
            prop_assert_eq!(next.usage(a, b), net.usage(a, b) + 1);
            prop_assert_eq!(
                next.line(id).unwrap().duration(),
                net.line(id).unwrap().duration() + extension.duration()
            );

            let undo = next.line_retractions(id).find(|r| r.end() == end).unwrap();
            next.commit(undo.into()).unwrap();
            prop_assert_eq!(next.state(), net.state());
            prop_assert_eq!(next.usage(a, b), net.usage(a, b));
            prop_assert_eq!(next.overtime(), net.overtime());
            prop_assert_eq!(next.total_links(), net.total_links());
            prop_assert_eq!(next.quality(), net.quality());
        }
    }

    /// Ensures moves generated on a network replay identically on a clone of it
    #[test]
    fn prop_clone_replay(seed in any::<u64>(), prefix in 0usize..20, steps in 0usize..40) {
        let rails = lattice();
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut net = Network::new(&rails, 150);
        random_moves(&mut net, prefix, 4, &mut rng);

        let mut clone = net.clone();
        for mv in random_moves(&mut net, steps, 4, &mut rng) {
            prop_assert!(clone.commit(mv).is_ok());
        }
        prop_assert_eq!(clone.state(), net.state());
        prop_assert_eq!(clone.overtime(), net.overtime());
        prop_assert_eq!(clone.total_links(), net.total_links());
    }
}
