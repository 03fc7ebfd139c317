//! O(log n)-per-draw categorical (discrete) distribution, built once from a
//! weight vector via a prefix-sum table and sampled by inverse-CDF binary
//! search, as a reusable sampler object rather than a one-shot free
//! function.

use rand::Rng;

/// A discrete distribution over `0..n`, `sample()` returning index `i` with
/// probability `w[i] / sum(w)`. Construction is O(n); each draw is
/// O(log n). Weights must be non-negative; a zero-sum weight vector is a
/// programmer error (spec §4.2) and is not checked here — the categorical
/// exists to serve the resampling family, which only ever builds one from a
/// just-normalized weight vector.
pub struct Categorical {
    prefix_sums: Vec<f64>,
}

impl Categorical {
    pub fn new(weights: &[f64]) -> Self {
        let mut prefix_sums = Vec::with_capacity(weights.len());
        let mut running = 0.0;
        for &w in weights {
            running += w;
            prefix_sums.push(running);
        }
        Categorical { prefix_sums }
    }

    /// Draws an index `i` with probability proportional to its original
    /// weight. Panics if every weight was zero (spec §7 — a zero-weight
    /// draw from a categorical is a programmer-violation invariant breach,
    /// not a recoverable error).
    pub fn sample(&self, rng: &mut impl Rng) -> usize {
        let total = *self.prefix_sums.last().expect("categorical built from empty weight vector");
        assert!(total > 0.0, "categorical distribution has zero total weight");
        let target = rng.random::<f64>() * total;
        match self
            .prefix_sums
            .binary_search_by(|sum| sum.partial_cmp(&target).unwrap())
        {
            Ok(i) => i,
            Err(i) => i.min(self.prefix_sums.len() - 1),
        }
    }
}
