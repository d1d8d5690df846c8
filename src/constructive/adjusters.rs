//! Adjusters turn heuristic scores into non negative selection weights.

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Scores further apart than this are not fed to a top-N softmax, since the
/// exponential would swamp everything but the best candidate anyway
pub const SOFTMAX_SAFETY_BOUND: f64 = 100.0;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Adjuster {
    /// Scores as they are, clamped at zero
    #[default]
    Relu,
    /// All weight on the best score, shared equally between ties
    Argmax,
    Softmax,
    /// Softmax over the `n + 1` best scores only
    SoftN { n: usize },
}

impl Adjuster {
    pub fn adjust(&self, scores: &[f64]) -> Vec<f64> {
        match *self {
            Adjuster::Relu => relu(scores),
            Adjuster::Argmax => argmax(scores),
            Adjuster::Softmax => softmax(scores),
            Adjuster::SoftN { n } => soft_n(scores, n),
        }
    }
}

pub fn relu(scores: &[f64]) -> Vec<f64> {
    scores.iter().map(|&w| w.max(0.0)).collect()
}

pub fn argmax(scores: &[f64]) -> Vec<f64> {
    let Some(best) = scores.iter().copied().map(OrderedFloat).max() else {
        return Vec::new();
    };
    let ties = scores.iter().filter(|&&w| OrderedFloat(w) == best).count() as f64;
    scores.iter().map(|&w| if OrderedFloat(w) == best { 1.0 / ties } else { 0.0 }).collect()
}

pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let Some(best) = scores.iter().copied().map(OrderedFloat).max() else {
        return Vec::new();
    };
    let exp = scores.iter().map(|&w| (w - best.0).exp()).collect_vec();
    let total: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / total).collect()
}

/// Softmax over the `n + 1` highest scores, shifted so the lowest of them sits at
/// zero. Everything below gets no weight. Falls back to [`argmax`] when those scores
/// are all equal or spread further than [`SOFTMAX_SAFETY_BOUND`].
pub fn soft_n(scores: &[f64], n: usize) -> Vec<f64> {
    let top = scores
        .iter()
        .copied()
        .map(OrderedFloat)
        .sorted_unstable_by(|a, b| b.cmp(a))
        .take(n + 1)
        .collect_vec();
    let (Some(first), Some(floor)) = (top.first(), top.last()) else {
        return Vec::new();
    };
    let spread = first.0 - floor.0;
    if spread == 0.0 || spread > SOFTMAX_SAFETY_BOUND {
        return argmax(scores);
    }
    let exp = scores
        .iter()
        .map(|&w| if w >= floor.0 { (w - floor.0).exp() } else { 0.0 })
        .collect_vec();
    let total: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / total).collect()
}

/// Draw an index with probability proportional to its weight. Weights that are
/// not positive are never drawn; `None` if no weight is.
pub fn sample(weights: &[f64], rng: &mut fastrand::Rng) -> Option<usize> {
    let positive = |w: f64| w > 0.0;
    let total: f64 = weights.iter().copied().filter(|&w| positive(w)).sum();
    if !(total > 0.0) {
        return None;
    }
    let mut target = rng.f64() * total;
    for (i, &w) in weights.iter().enumerate().filter(|&(_, &w)| positive(w)) {
        if target < w {
            return Some(i);
        }
        target -= w;
    }
    // Rounding can leave a sliver past the last weight
    weights.iter().rposition(|&w| positive(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    /// Ensures ties share the argmax weight equally
    #[test]
    fn test_argmax_ties() {
        assert_eq!(argmax(&[5.0, 5.0, 1.0]), vec![0.5, 0.5, 0.0]);
        assert_eq!(argmax(&[1.0, 7.0, 2.0]), vec![0.0, 1.0, 0.0]);
        assert!(argmax(&[]).is_empty());
    }

    /// Ensures the top-N softmax falls back to argmax when it cannot separate scores
    #[test]
    fn test_soft_n_fallbacks() {
        assert_eq!(soft_n(&[5.0, 5.0, 1.0], 1), vec![0.5, 0.5, 0.0]);
        assert_eq!(soft_n(&[500.0, 1.0, 1.0], 1), vec![1.0, 0.0, 0.0]);
        assert_eq!(Adjuster::SoftN { n: 1 }.adjust(&[5.0, 5.0, 1.0]), vec![0.5, 0.5, 0.0]);
    }

    /// Ensures the top-N softmax only weighs the best candidates
    #[test]
    fn test_soft_n_weights() {
        let e = 1f64.exp();
        let weights = soft_n(&[3.0, 2.0, 1.0, 0.0], 1);
        assert!(close(&weights, &[e / (e + 1.0), 1.0 / (e + 1.0), 0.0, 0.0]));
        let weights = soft_n(&[0.0, 2.0], 3);
        assert!(close(&weights, &[1.0 / (1.0 + e * e), e * e / (1.0 + e * e)]));
    }

    /// Ensures softmax is stable for large scores and relu clamps negatives
    #[test]
    fn test_softmax_and_relu() {
        let weights = softmax(&[1000.0, 1000.0]);
        assert!(close(&weights, &[0.5, 0.5]));
        assert!((softmax(&[1.0, 2.0, 3.0]).iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(relu(&[-3.0, 0.0, 2.5]), vec![0.0, 0.0, 2.5]);
    }

    /// Ensures sampling never draws a zero weight and gives up when nothing is weighted
    #[test]
    fn test_sample() {
        let mut rng = fastrand::Rng::with_seed(4);
        for _ in 0..200 {
            let i = sample(&[0.0, 2.0, 0.0, 1.0], &mut rng).unwrap();
            assert!(i == 1 || i == 3);
        }
        assert_eq!(sample(&[0.0, 0.0], &mut rng), None);
        assert_eq!(sample(&[], &mut rng), None);
    }
}
