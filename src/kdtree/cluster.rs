//! Connected-component labeling of occupied buckets under 26-neighbor
//! adjacency (spec §4.1). Flood fill launched from each unlabeled leaf,
//! in leaf-insertion order, assigning labels `0, 1, 2, ...` in launch order.

use super::KdTree;
use std::collections::VecDeque;

const NEIGHBOR_OFFSETS: [i64; 3] = [-1, 0, 1];

impl KdTree {
    /// Assigns a cluster label to every leaf, two leaves sharing a label iff
    /// they are connected through a chain of leaves whose bucket keys differ
    /// by at most 1 on every axis. Returns the number of clusters found.
    pub fn cluster(&mut self) -> usize {
        for leaf in &mut self.leaves {
            leaf.cluster = -1;
        }

        let mut next_label = 0i32;
        let mut queue = VecDeque::new();

        for start in 0..self.leaves.len() {
            if self.leaves[start].cluster != -1 {
                continue;
            }
            self.leaves[start].cluster = next_label;
            queue.push_back(start);

            while let Some(cur) = queue.pop_front() {
                let key = self.leaves[cur].key;
                for dx in NEIGHBOR_OFFSETS {
                    for dy in NEIGHBOR_OFFSETS {
                        for dz in NEIGHBOR_OFFSETS {
                            if dx == 0 && dy == 0 && dz == 0 {
                                continue;
                            }
                            let neighbor_key = [key[0] + dx, key[1] + dy, key[2] + dz];
                            if let Some(neighbor_idx) = self.find_leaf(neighbor_key) {
                                if self.leaves[neighbor_idx].cluster == -1 {
                                    self.leaves[neighbor_idx].cluster = next_label;
                                    queue.push_back(neighbor_idx);
                                }
                            }
                        }
                    }
                }
            }

            next_label += 1;
        }

        next_label as usize
    }
}
