//! Insert and lookup for the histogram kd-tree: an iterative descent that
//! walks stems from the root comparing the query against each stem's
//! split, tracking the parent slot so a leaf can be split in place once
//! reached.
//!
//! A leaf here holds exactly one distinct bucket key. A second, different
//! key landing in an occupied leaf triggers a split: a new stem is
//! inserted in the leaf's place, on whichever of the three axes has the
//! largest spread between the colliding keys (spec §4.1), with the split
//! value the lower of the two colliding keys on that axis.

use super::node::{self, Leaf, Stem, LEAF_OFFSET, NONE};
use super::KdTree;

impl KdTree {
    pub(crate) fn insert_key(&mut self, key: [i64; 3], weight: f64) {
        if self.root == NONE {
            if self.pool_exhausted(1) {
                #[cfg(feature = "tracing")]
                tracing::warn!("kd-tree node pool exhausted, dropping insert");
                return;
            }
            self.root = self.push_leaf(Leaf::new(key, weight));
            return;
        }

        let mut idx = self.root;
        let mut parent: Option<(usize, bool)> = None; // (stem idx, is_left)

        loop {
            if node::is_stem_index(idx) {
                let stem = self.stems[idx];
                let go_left = key[stem.split_dim] <= stem.split_val;
                parent = Some((idx, go_left));
                idx = if go_left { stem.left } else { stem.right };
            } else {
                let leaf_idx = idx - LEAF_OFFSET;
                if self.leaves[leaf_idx].key == key {
                    self.leaves[leaf_idx].weight += weight;
                    return;
                }

                if self.pool_exhausted(2) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("kd-tree node pool exhausted, dropping insert");
                    return;
                }
                let new_node = self.split_leaf(leaf_idx, key, weight);
                match parent {
                    Some((stem_idx, true)) => self.stems[stem_idx].left = new_node,
                    Some((stem_idx, false)) => self.stems[stem_idx].right = new_node,
                    None => self.root = new_node,
                }
                return;
            }
        }
    }

    /// Splits the leaf at `leaf_idx` (whose key differs from `new_key`) into
    /// a stem with two leaf children, one holding the leaf's original key,
    /// the other the incoming `new_key`/`new_weight`. Returns the encoded
    /// index of the new stem.
    fn split_leaf(&mut self, leaf_idx: usize, new_key: [i64; 3], new_weight: f64) -> usize {
        let old = self.leaves[leaf_idx];

        let mut split_dim = 0;
        let mut max_spread = -1i64;
        for axis in 0..3 {
            let spread = (new_key[axis] - old.key[axis]).abs();
            if spread > max_spread {
                max_spread = spread;
                split_dim = axis;
            }
        }
        // the two keys differ by at least 1 on `split_dim` (that's why it was
        // chosen); splitting at the lower of the two sends it left and the
        // higher one right.
        let split_val = new_key[split_dim].min(old.key[split_dim]);

        let old_goes_left = old.key[split_dim] <= split_val;

        // reuse the existing leaf slot for whichever child stays "old", push
        // a fresh leaf slot for the new key.
        let new_leaf_idx = self.push_leaf_raw(Leaf::new(new_key, new_weight));
        let old_encoded = leaf_idx + LEAF_OFFSET;
        let new_encoded = new_leaf_idx + LEAF_OFFSET;

        let (left, right) = if old_goes_left {
            (old_encoded, new_encoded)
        } else {
            (new_encoded, old_encoded)
        };

        self.stems.push(Stem {
            left,
            right,
            split_dim,
            split_val,
        });
        self.stems.len() - 1
    }

    fn push_leaf(&mut self, leaf: Leaf) -> usize {
        self.push_leaf_raw(leaf) + LEAF_OFFSET
    }

    fn push_leaf_raw(&mut self, leaf: Leaf) -> usize {
        self.leaves.push(leaf);
        self.leaves.len() - 1
    }

    /// Walks the tree for the leaf whose key equals `key`, or `None` if
    /// there isn't one. Used by `get_cluster` and the flood-fill clustering
    /// pass to look up a bucket's 26 neighbors.
    pub(crate) fn find_leaf(&self, key: [i64; 3]) -> Option<usize> {
        if self.root == NONE {
            return None;
        }
        let mut idx = self.root;
        loop {
            if node::is_stem_index(idx) {
                let stem = self.stems[idx];
                idx = if key[stem.split_dim] <= stem.split_val {
                    stem.left
                } else {
                    stem.right
                };
            } else {
                let leaf_idx = idx - LEAF_OFFSET;
                return if self.leaves[leaf_idx].key == key {
                    Some(leaf_idx)
                } else {
                    None
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::node::LEAF_OFFSET;
    use super::*;
    use crate::pose::Pose;

    #[test]
    fn find_leaf_locates_inserted_bucket() {
        let mut tree = KdTree::with_capacity(30);
        tree.insert(&Pose::new(0.1, 0.1, 0.0), 1.0);
        let key = KdTree::bucket_key(&Pose::new(0.1, 0.1, 0.0));
        assert!(tree.find_leaf(key).is_some());
    }

    #[test]
    fn find_leaf_misses_unoccupied_bucket() {
        let mut tree = KdTree::with_capacity(30);
        tree.insert(&Pose::new(0.1, 0.1, 0.0), 1.0);
        let key = KdTree::bucket_key(&Pose::new(50.0, 50.0, 0.0));
        assert!(tree.find_leaf(key).is_none());
    }

    #[test]
    fn split_keeps_both_keys_reachable() {
        let mut tree = KdTree::with_capacity(30);
        let a = Pose::new(0.1, 0.1, 0.0);
        let b = Pose::new(20.0, 0.1, 0.0);
        tree.insert(&a, 1.0);
        tree.insert(&b, 1.0);
        assert_eq!(tree.leaf_count(), 2);
        assert!(tree.find_leaf(KdTree::bucket_key(&a)).is_some());
        assert!(tree.find_leaf(KdTree::bucket_key(&b)).is_some());
        assert!(node::is_stem_index(tree.root));
    }

    #[test]
    fn root_encodes_single_leaf_as_leaf_index() {
        let mut tree = KdTree::with_capacity(30);
        tree.insert(&Pose::new(0.1, 0.1, 0.0), 1.0);
        assert!(tree.root >= LEAF_OFFSET);
    }
}
