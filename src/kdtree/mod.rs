//! Bucketed 3-D (x, y, theta) histogram over pose samples, doubling as a
//! single-linkage cluster index under 26-neighbor bucket adjacency.
//!
//! See spec §4.1. This is the leaf component of the whole crate — the KLD
//! resample-limit formula consumes [`KdTree::leaf_count`], and the cluster
//! statistics pass (`crate::cluster`) consumes [`KdTree::cluster`] /
//! [`KdTree::get_cluster`].

mod cluster;
mod construction;
mod node;

use crate::pose::Pose;
use node::{Leaf, Stem};

/// Fixed bucket cell sizes, per spec §4.1: half-meter cells in x/y, ten
/// degrees in heading.
pub const CELL_X: f64 = 0.5;
pub const CELL_Y: f64 = 0.5;
pub const CELL_THETA: f64 = std::f64::consts::PI / 9.0;

/// Label returned by [`KdTree::get_cluster`] when the queried pose falls in
/// no occupied bucket.
pub const NO_CLUSTER: i32 = -1;

/// The histogram / cluster kd-tree.
///
/// Backed by two flat arenas (`stems`, `leaves`) sized once at construction
/// to `capacity` nodes total (the caller is expected to size this to `3 *
/// max_samples`, per spec §3/§4.1). `clear()` truncates both arenas in O(1)
/// without releasing the underlying allocation, so a filter can call
/// `clear()` + re-insert every cycle with no steady-state allocation.
pub struct KdTree {
    pub(crate) stems: Vec<Stem>,
    pub(crate) leaves: Vec<Leaf>,
    pub(crate) root: usize,
    capacity: usize,
}

impl KdTree {
    /// Allocates a tree whose combined stem+leaf node pool holds at most
    /// `capacity` nodes. The caller should pass `3 * max_samples` (spec
    /// §3: "pool sized ≥ 3x max_samples by construction").
    pub fn with_capacity(capacity: usize) -> Self {
        KdTree {
            stems: Vec::with_capacity(capacity),
            leaves: Vec::with_capacity(capacity),
            root: node::NONE,
            capacity,
        }
    }

    /// Resets the tree to empty. Does not free the backing node pool.
    pub fn clear(&mut self) {
        self.stems.clear();
        self.leaves.clear();
        self.root = node::NONE;
    }

    /// Number of currently occupied histogram buckets — the `k` consumed by
    /// the KLD resample-limit formula.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    fn total_nodes(&self) -> usize {
        self.stems.len() + self.leaves.len()
    }

    fn pool_exhausted(&self, extra: usize) -> bool {
        self.total_nodes() + extra > self.capacity
    }

    /// Converts a continuous pose into its integer bucket key: component-wise
    /// floor division by the fixed cell sizes.
    pub fn bucket_key(pose: &Pose) -> [i64; 3] {
        [
            (pose.x / CELL_X).floor() as i64,
            (pose.y / CELL_Y).floor() as i64,
            (pose.theta / CELL_THETA).floor() as i64,
        ]
    }

    /// Inserts a weighted sample, creating or updating the bucket it lands
    /// in. Silently drops the insert if the node pool is exhausted (spec
    /// §7 — pool exhaustion degrades gracefully rather than panicking).
    pub fn insert(&mut self, pose: &Pose, weight: f64) {
        let key = Self::bucket_key(pose);
        self.insert_key(key, weight);
    }

    /// The label of the leaf containing `pose`, or [`NO_CLUSTER`] if no
    /// bucket at that key has been inserted (or clustering hasn't run yet).
    pub fn get_cluster(&self, pose: &Pose) -> i32 {
        let key = Self::bucket_key(pose);
        match self.find_leaf(key) {
            Some(idx) => self.leaves[idx].cluster,
            None => NO_CLUSTER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tree_is_empty() {
        let tree = KdTree::with_capacity(30);
        assert_eq!(tree.leaf_count(), 0);
    }

    #[test]
    fn insert_same_bucket_twice_merges_weight() {
        let mut tree = KdTree::with_capacity(30);
        let pose = Pose::new(0.1, 0.1, 0.0);
        tree.insert(&pose, 1.0);
        tree.insert(&pose, 1.0);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.leaves[0].weight, 2.0);
    }

    #[test]
    fn insert_distinct_buckets_grows_leaf_count() {
        let mut tree = KdTree::with_capacity(30);
        tree.insert(&Pose::new(0.1, 0.1, 0.0), 1.0);
        tree.insert(&Pose::new(10.0, 10.0, 0.0), 1.0);
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn clear_resets_but_keeps_capacity() {
        let mut tree = KdTree::with_capacity(30);
        tree.insert(&Pose::new(0.1, 0.1, 0.0), 1.0);
        tree.clear();
        assert_eq!(tree.leaf_count(), 0);
        assert_eq!(tree.stems.capacity(), 30);
    }

    #[test]
    fn insert_order_does_not_change_final_leaf_set() {
        let poses = [
            Pose::new(0.1, 0.1, 0.0),
            Pose::new(5.0, 5.0, 1.0),
            Pose::new(-3.0, 2.0, -1.0),
            Pose::new(0.6, 0.1, 0.0),
        ];
        let mut forward = KdTree::with_capacity(100);
        for p in &poses {
            forward.insert(p, 1.0);
        }
        let mut backward = KdTree::with_capacity(100);
        for p in poses.iter().rev() {
            backward.insert(p, 1.0);
        }
        assert_eq!(forward.leaf_count(), backward.leaf_count());
    }

    #[test]
    fn pool_exhaustion_drops_inserts_silently() {
        let mut tree = KdTree::with_capacity(2);
        for i in 0..10 {
            tree.insert(&Pose::new(i as f64 * 10.0, 0.0, 0.0), 1.0);
        }
        assert!(tree.leaf_count() <= 2);
    }
}
