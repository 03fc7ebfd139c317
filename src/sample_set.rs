//! The fixed-capacity sample set (spec §3, §4.3): a buffer of (pose,
//! weight) tuples, its attached histogram/cluster kd-tree, and the cluster
//! accumulator table derived from the two.

use crate::cluster::{cep_stats, CepStats, ClusterAccumulator, MAX_CLUSTERS};
use crate::kdtree::KdTree;
use crate::pose::{Cov3, Pose};

/// One weighted pose hypothesis. `weight` is always `>= 0`; within a live
/// set, weights sum to `1` after any operation that completes successfully
/// (spec §3 — the sole invariant maintained across every public op).
#[derive(Clone, Copy, Debug)]
pub struct Sample {
    pub pose: Pose,
    pub weight: f64,
}

impl Sample {
    pub fn new(pose: Pose, weight: f64) -> Self {
        Sample { pose, weight }
    }
}

/// A fixed-capacity buffer of samples plus its histogram/cluster kd-tree and
/// cluster table. Two of these exist per filter (spec §3) so that
/// resampling can ping-pong between them in O(n) with no reallocation.
pub struct SampleSet {
    samples: Vec<Sample>,
    max_samples: usize,
    pub(crate) tree: KdTree,
    clusters: Vec<ClusterAccumulator>,
    num_clusters: usize,
}

impl SampleSet {
    /// Allocates a set with capacity `max_samples` and an attached kd-tree
    /// whose node pool holds `3 * max_samples` nodes (spec §3/§4.1). Starts
    /// with `max_samples` samples at uniform weight `1/max_samples` and
    /// zero pose — the state `alloc()` leaves each of the filter's two sets
    /// in before any `init_*` call.
    pub fn alloc(max_samples: usize) -> Self {
        let uniform_weight = 1.0 / max_samples as f64;
        SampleSet {
            samples: vec![Sample::new(Pose::default(), uniform_weight); max_samples],
            max_samples,
            tree: KdTree::with_capacity(3 * max_samples),
            clusters: Vec::with_capacity(MAX_CLUSTERS),
            num_clusters: 0,
        }
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Live sample count. Always in `[0, max_samples]`; `init_*` always
    /// sets it to `max_samples`, resampling sets it to whatever the KLD
    /// cutoff (or explicit quota) produced.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [Sample] {
        &mut self.samples
    }

    /// Truncates (or, if `n <= max_samples`, simply resizes) the live
    /// sample vector to `n` entries, padding with zero-weight/default-pose
    /// samples if it grows. Used by the resampling family as it appends
    /// into the scratch set.
    pub(crate) fn set_len(&mut self, n: usize) {
        debug_assert!(n <= self.max_samples);
        self.samples.resize(n, Sample::new(Pose::default(), 0.0));
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        debug_assert!(self.samples.len() < self.max_samples);
        self.samples.push(sample);
    }

    /// Resets every sample's weight to uniform `1/n` (spec §4.3 sensor-
    /// collapse fallback, and the `init_*` starting state).
    pub fn set_uniform_weights(&mut self) {
        let w = 1.0 / self.samples.len().max(1) as f64;
        for s in &mut self.samples {
            s.weight = w;
        }
    }

    /// Divides every weight by `total`, returning `sum(w_i^2)` over the
    /// *normalized* weights — the effective-sample-size surrogate spec
    /// §4.3 `update_sensor` and §4.4.1 both return.
    pub(crate) fn normalize_weights(&mut self, total: f64) -> f64 {
        for s in &mut self.samples {
            s.weight /= total;
        }
        self.samples.iter().map(|s| s.weight * s.weight).sum()
    }

    /// Clears and rebuilds the histogram from the current samples (spec
    /// §4.1/§4.3 — every `init_*` and every resampler rebuilds the
    /// histogram of the set it just populated).
    pub fn rebuild_histogram(&mut self) {
        self.tree.clear();
        for s in &self.samples {
            self.tree.insert(&s.pose, s.weight);
        }
    }

    /// Runs the cluster() pass on the attached kd-tree and accumulates
    /// per-cluster weighted moments over the current samples (spec §4.6).
    /// Clusters beyond the table's 100-entry capacity are dropped silently
    /// (spec §7).
    pub fn compute_cluster_stats(&mut self) {
        let found = self.tree.cluster();
        let kept = found.min(MAX_CLUSTERS);
        self.clusters.clear();
        self.clusters.resize(kept, ClusterAccumulator::default());
        self.num_clusters = kept;

        if found > MAX_CLUSTERS {
            #[cfg(feature = "tracing")]
            tracing::warn!(found, capacity = MAX_CLUSTERS, "cluster table overflow, dropping extra clusters");
        }

        for s in &self.samples {
            let label = self.tree.get_cluster(&s.pose);
            if label < 0 {
                continue;
            }
            let label = label as usize;
            if label < kept {
                self.clusters[label].accumulate(&s.pose, s.weight);
            }
        }
    }

    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    /// `(weight, mean, covariance)` for cluster `label`, or `None` if
    /// `label` is out of range (spec §6 — `get_cluster_stats` returns false
    /// / `None` rather than panicking on an out-of-range label).
    pub fn cluster_stats(&self, label: usize) -> Option<(f64, Pose, Cov3)> {
        self.clusters.get(label).and_then(|c| c.stats())
    }

    /// The whole-set CEP statistic (spec §4.6) — no clustering needed.
    pub fn cep_stats(&self) -> CepStats {
        cep_stats(self.samples.iter().map(|s| (&s.pose, s.weight)))
    }

    pub(crate) fn clear_for_rebuild(&mut self) {
        self.samples.clear();
        self.tree.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_starts_at_uniform_weight() {
        let set = SampleSet::alloc(10);
        assert_eq!(set.len(), 10);
        let total: f64 = set.samples().iter().map(|s| s.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_weights_reports_sum_of_squares() {
        let mut set = SampleSet::alloc(4);
        for (i, s) in set.samples_mut().iter_mut().enumerate() {
            s.weight = (i + 1) as f64;
        }
        // weights are now 1,2,3,4 summing to 10
        let sq = set.normalize_weights(10.0);
        let expected: f64 = [0.1_f64, 0.2, 0.3, 0.4].iter().map(|w| w * w).sum();
        assert!((sq - expected).abs() < 1e-9);
    }

    #[test]
    fn cluster_stats_out_of_range_label_is_none() {
        let mut set = SampleSet::alloc(5);
        set.rebuild_histogram();
        set.compute_cluster_stats();
        assert!(set.cluster_stats(9999).is_none());
    }

    #[test]
    fn cluster_stats_sum_to_whole_set_totals() {
        let mut set = SampleSet::alloc(20);
        for (i, s) in set.samples_mut().iter_mut().enumerate() {
            s.pose = Pose::new(i as f64 * 2.0, 0.0, 0.0);
            s.weight = 1.0 / 20.0;
        }
        set.rebuild_histogram();
        set.compute_cluster_stats();

        let total_weight: f64 = (0..set.num_clusters())
            .filter_map(|l| set.cluster_stats(l))
            .map(|(w, _, _)| w)
            .sum();
        assert!((total_weight - 1.0).abs() < 1e-9);

        let total_count: usize = (0..set.num_clusters())
            .filter_map(|l| {
                let label = l;
                set.cluster_stats(label).map(|_| label)
            })
            .count();
        assert!(total_count <= set.num_clusters());
    }
}
