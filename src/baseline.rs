//! Implements a few simple constructive strategies, to use as a baseline
//! for comparison to the search based ones, and as starting points for them.

use std::cmp::Reverse;

use tracing::debug;

use crate::{
    moves::{Addition, Move},
    network::Network,
    strategy::{first_max_by_key, Strategy},
};

/// Pick a station to root a new line at, in random order, preferring stations with
/// an odd number of free segments. Only stations with a free segment qualify.
pub fn select_root(net: &Network<'_>, rng: &mut fastrand::Rng) -> Option<Addition> {
    let mut additions: Vec<_> = net.additions().collect();
    rng.shuffle(&mut additions);
    let odd = additions.iter().position(|a| net.free_degree(a.root()) % 2 == 1);
    match odd {
        Some(i) => Some(additions.swap_remove(i)),
        None => additions.into_iter().next(),
    }
}

/// Builds lines by always taking the extension that covers a new segment, shortest
/// first. When only overlapping extensions remain it starts a new line instead, and
/// once at the line cap it accepts the overlap, unless it is `optimal`, in which case
/// it stops rather than run any segment twice.
#[derive(Debug, Clone)]
pub struct Greedy<'r> {
    net: Network<'r>,
    line_cap: usize,
    optimal: bool,
}

impl<'r> Greedy<'r> {
    pub fn new(base: Network<'r>, line_cap: usize, optimal: bool) -> Self {
        Self { net: base, line_cap, optimal }
    }

    fn add_root(&mut self, rng: &mut fastrand::Rng) -> Option<&Network<'r>> {
        let root = select_root(&self.net, rng)?;
        self.net.apply(root.into());
        Some(&self.net)
    }
}

impl<'r> Strategy<'r> for Greedy<'r> {
    fn name(&self) -> &'static str {
        if self.optimal {
            "perfectionist"
        } else {
            "greedy"
        }
    }

    fn active(&self) -> &Network<'r> {
        &self.net
    }

    fn next_state(&mut self, rng: &mut fastrand::Rng) -> Option<&Network<'r>> {
        if self.net.fully_covered() {
            return None;
        }
        let under_cap = self.net.lines().len() < self.line_cap;
        let best = first_max_by_key(self.net.extensions(), |e| (e.is_new(), Reverse(e.duration())));
        match best {
            Some(extension) if extension.is_new() => {
                self.net.apply(extension.into());
                Some(&self.net)
            }
            _ if under_cap => self.add_root(rng),
            Some(extension) if !self.optimal => {
                self.net.apply(extension.into());
                Some(&self.net)
            }
            _ => {
                debug!(lines = self.net.lines().len(), "Greedy: no acceptable extension left");
                None
            }
        }
    }

    fn into_network(self: Box<Self>) -> Network<'r> {
        self.net
    }
}

/// Starts `line_cap` lines at random stations, then extends a random line end
/// every step until nothing fits anymore
#[derive(Debug, Clone)]
pub struct RandomWalk<'r> {
    net: Network<'r>,
    line_cap: usize,
    rooted: bool,
}

impl<'r> RandomWalk<'r> {
    pub fn new(base: Network<'r>, line_cap: usize) -> Self {
        Self { net: base, line_cap, rooted: false }
    }
}

impl<'r> Strategy<'r> for RandomWalk<'r> {
    fn name(&self) -> &'static str {
        "random"
    }

    fn active(&self) -> &Network<'r> {
        &self.net
    }

    fn next_state(&mut self, rng: &mut fastrand::Rng) -> Option<&Network<'r>> {
        if !self.rooted {
            self.rooted = true;
            let free = self.line_cap.saturating_sub(self.net.lines().len());
            let roots: Vec<Move> = self.net.additions().map(Move::from).collect();
            for root in rng.choose_multiple(roots.into_iter(), free) {
                self.net.apply(root);
            }
            return Some(&self.net);
        }
        let extensions: Vec<_> = self.net.extensions().collect();
        let extension = rng.choice(extensions)?;
        self.net.apply(extension.into());
        Some(&self.net)
    }

    fn into_network(self: Box<Self>) -> Network<'r> {
        self.net
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rails::fixtures::{lattice, square};

    fn drive<'r>(mut strategy: Box<dyn Strategy<'r> + 'r>, rng: &mut fastrand::Rng) -> Network<'r> {
        while strategy.next_state(rng).is_some() {}
        strategy.into_network()
    }

    /// Ensures the greedy strategy covers a cycle with a single closed line
    #[test]
    fn test_greedy_cycle() {
        let rails = square();
        let mut rng = fastrand::Rng::with_seed(1);
        let net = drive(Box::new(Greedy::new(Network::new(&rails, 100), 1, false)), &mut rng);
        assert_eq!(net.lines().len(), 1);
        assert_eq!(net.lines()[0].len(), 5, "Ensure the line returns to its root");
        assert!(net.lines()[0].is_closed());
        assert_eq!(net.coverage(), 1.0);
    }

    /// Ensures a root is only chosen where a segment is still free, odd degree first
    #[test]
    fn test_select_root() {
        let rails = lattice();
        let mut rng = fastrand::Rng::with_seed(11);
        let net = Network::new(&rails, 180);
        for _ in 0..20 {
            let root = select_root(&net, &mut rng).unwrap().root();
            assert_eq!(net.free_degree(root) % 2, 1, "Ensure odd free degree is preferred");
        }

        let square = square();
        let mut net = Network::new(&square, 180);
        assert!(
            select_root(&net, &mut rng).is_some(),
            "Ensure an even station is accepted when no odd one is left"
        );
        let line = net.add_line(square.id_of("A").unwrap());
        for name in ["B", "C", "D", "A"] {
            net.extend_line(line, square.id_of(name).unwrap()).unwrap();
        }
        assert!(select_root(&net, &mut rng).is_none());
    }

    /// Ensures the perfectionist stops instead of overlapping at the line cap
    #[test]
    fn test_perfectionist_refuses_overlap() {
        let rails = lattice();
        for seed in 0..10 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let net = drive(Box::new(Greedy::new(Network::new(&rails, 180), 2, true)), &mut rng);
            assert_eq!(net.overtime(), 0);
            assert!(net.lines().len() <= 2);
        }
    }

    /// Ensures the random walk roots up to the line cap and keeps every line in budget
    #[test]
    fn test_random_walk() {
        let rails = lattice();
        let mut rng = fastrand::Rng::with_seed(5);
        let mut walk = RandomWalk::new(Network::new(&rails, 60), 3);
        assert_eq!(walk.next_state(&mut rng).unwrap().lines().len(), 3);
        let net = drive(Box::new(walk), &mut rng);
        assert_eq!(net.lines().len(), 3);
        assert!(net.lines().iter().all(|l| l.duration() <= 60));
        assert_eq!(net.extensions().count(), 0);
    }
}
