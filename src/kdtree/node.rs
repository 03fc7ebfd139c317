//! Node types for the bucketed histogram / cluster kd-tree: two flat
//! `Vec`s (stems, leaves) addressed by `usize` index rather than a
//! pointer-linked tree, with a sentinel offset distinguishing a "stem
//! index" from a "leaf index" in the same index space. `clear()` truncates
//! both `Vec`s without releasing their backing allocation, so repeated
//! clear-then-rebuild cycles (one per filter cycle) do not reallocate.

/// Sentinel marking the boundary between stem indices (`< LEAF_OFFSET`) and
/// leaf indices (`>= LEAF_OFFSET`, with the leaf's real index being
/// `idx - LEAF_OFFSET`). Chosen far above any plausible node-pool size.
pub(crate) const LEAF_OFFSET: usize = usize::MAX / 2;

/// No child / no root.
pub(crate) const NONE: usize = usize::MAX;

/// Internal split node. `split_dim` in `0..3` selects x/y/theta bucket-key
/// component; `split_val` is the integer pivot on that axis.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stem {
    pub(crate) left: usize,
    pub(crate) right: usize,
    pub(crate) split_dim: usize,
    pub(crate) split_val: i64,
}

/// A single occupied histogram bucket: its integer key, the accumulated
/// sample weight that landed in it, and the cluster label assigned by the
/// most recent `cluster()` pass (`-1` until clustered).
#[derive(Clone, Copy, Debug)]
pub(crate) struct Leaf {
    pub(crate) key: [i64; 3],
    pub(crate) weight: f64,
    pub(crate) cluster: i32,
}

impl Leaf {
    pub(crate) fn new(key: [i64; 3], weight: f64) -> Self {
        Leaf {
            key,
            weight,
            cluster: -1,
        }
    }
}

#[inline]
pub(crate) fn is_stem_index(idx: usize) -> bool {
    idx < LEAF_OFFSET
}
