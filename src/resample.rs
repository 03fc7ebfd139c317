//! The resampling family (spec §4.4): draws a new generation of samples
//! into the scratch set, limited by the KLD resample-limit formula, with
//! variants for plain resampling, map-guided random injection (the
//! "kidnapped robot" recovery path), explicit particle addition, and
//! hypothesis-guided resampling for an external multi-hypothesis tracker.
//!
//! Every variant follows the same shape: draw from a [`Categorical`] built
//! over the source set's weights (or, for the guided variants, interleave
//! draws from a secondary source), insert the draw's bucket key into the
//! destination's histogram, and stop as soon as the occupied-bucket count
//! `k` drives [`resample_limit`] below the count already drawn.

use crate::hypothesis::Hypothesis;
use crate::kdtree::KdTree;
use crate::kld::{resample_limit, KldParams};
use crate::map::MapView;
use crate::pose::Cov3;
use crate::sample_set::{Sample, SampleSet};
use crate::sampling::{sample_gaussian, sample_uniform_free, Categorical, HeadingSpread};
use rand::Rng;

/// Draws from `from` with replacement, proportional to its current
/// weights, into `to` (already cleared by the caller), until `to`'s
/// histogram satisfies [`resample_limit`] or `n_max` is reached. The
/// shared core of every resample variant's baseline importance-resample
/// pass (spec §4.4.1).
fn importance_draw(rng: &mut impl Rng, from: &SampleSet, to: &mut SampleSet, kld: &KldParams, n_max: usize) {
    let weights: Vec<f64> = from.samples().iter().map(|s| s.weight).collect();
    let cat = Categorical::new(&weights);

    loop {
        let i = cat.sample(rng);
        let src = from.samples()[i];
        to.push(Sample::new(src.pose, 1.0));
        to.tree.insert(&src.pose, 1.0);

        let k = to.tree.leaf_count();
        let limit = resample_limit(k, kld);
        if to.len() >= limit || to.len() >= n_max {
            break;
        }
    }
}

/// Reinterprets a [`Hypothesis`]'s §9-convention `cov` into a genuine
/// `Cov3` for [`sample_gaussian`].
fn hyp_cov(hyp: &Hypothesis) -> Cov3 {
    let xy = hyp.xy_covariance();
    Cov3([[xy[0][0], xy[0][1], 0.0], [xy[1][0], xy[1][1], 0.0], [0.0, 0.0, hyp.cov[2][2]]])
}

/// Plain KLD-adaptive resample: draws from `from` with replacement,
/// proportional to its current weights, until the occupied-bucket count in
/// `to`'s freshly-rebuilt histogram satisfies [`resample_limit`] (spec
/// §4.4.1). `to` is cleared first. Returns the number of samples drawn.
pub fn resample(rng: &mut impl Rng, from: &SampleSet, to: &mut SampleSet, kld: &KldParams) -> usize {
    to.clear_for_rebuild();
    importance_draw(rng, from, to, kld, to.max_samples());
    finish(to);
    to.len()
}

/// Map-guided resample (spec §4.4.2): as [`resample`], but with
/// `N_max = max_samples - overhead_samples`, then — if the KLD cutoff left
/// fewer than `min_samples + 10` samples — tops up with up to 100 additional
/// map-constrained uniform draws (weight `1.0` each), never exceeding
/// `max_samples`. This is the "kidnapped robot" recovery path: a thin spray
/// of fresh map-uniform samples on top of the ordinary importance-resampled
/// population.
pub fn resample_map(
    rng: &mut impl Rng,
    from: &SampleSet,
    to: &mut SampleSet,
    map: &impl MapView,
    kld: &KldParams,
    overhead_samples: usize,
) -> usize {
    to.clear_for_rebuild();
    let n_max = to.max_samples().saturating_sub(overhead_samples).max(1);
    importance_draw(rng, from, to, kld, n_max);

    if to.len() < kld.min_samples + 10 {
        let room = to.max_samples().saturating_sub(to.len());
        let top_up = room.min(100);
        for _ in 0..top_up {
            let pose = sample_uniform_free(rng, map);
            to.push(Sample::new(pose, 1.0));
            to.tree.insert(&pose, 1.0);
        }
    }

    finish(to);
    to.len()
}

/// Fixed-injection resample (spec §4.4.3): as [`resample`], but with
/// `N_max = max_samples - k`, then appends exactly `k` fresh
/// map-constrained uniform samples (weight `1.0` each) — deliberate particle
/// injection on an external map update, distinct from [`resample_map`]'s
/// automatic low-population top-up.
pub fn resample_add_particles(
    rng: &mut impl Rng,
    from: &SampleSet,
    to: &mut SampleSet,
    k: usize,
    map: &impl MapView,
    kld: &KldParams,
) -> usize {
    to.clear_for_rebuild();
    let n_max = to.max_samples().saturating_sub(k).max(1);
    importance_draw(rng, from, to, kld, n_max);

    let room = to.max_samples().saturating_sub(to.len());
    let inject = k.min(room);
    for _ in 0..inject {
        let pose = sample_uniform_free(rng, map);
        to.push(Sample::new(pose, 1.0));
        to.tree.insert(&pose, 1.0);
    }

    finish(to);
    to.len()
}

/// Hypothesis-guided resample (spec §4.4.4): runs the ordinary importance
/// resample (§4.4.1) from `from`, capped at `max_samples - overhead_samples`,
/// as the population baseline, then allocates an equal
/// `(max_samples - baseline_count) / hyps.len()` share of the remaining
/// budget to each hypothesis, drawing from that hypothesis's Gaussian with
/// `theta` uniform (not drawn from the hypothesis's heading variance — spec
/// §4.4.4 calls for a uniform heading on hypothesis-sourced draws) and
/// accepting only (x, y) draws that land on a free map cell. Each
/// hypothesis gets exactly `budget` draw attempts; a rejected draw is
/// simply discarded rather than retried outside that budget, so a
/// hypothesis sitting entirely over occupied space can come up short of its
/// share. Falls back to [`resample`] if `hyps` is empty.
pub fn resample_hyps(
    rng: &mut impl Rng,
    from: &SampleSet,
    to: &mut SampleSet,
    map: &impl MapView,
    hyps: &[Hypothesis],
    kld: &KldParams,
    overhead_samples: usize,
) -> usize {
    if hyps.is_empty() {
        return resample(rng, from, to, kld);
    }

    to.clear_for_rebuild();
    let n_max = to.max_samples().saturating_sub(overhead_samples).max(1);
    importance_draw(rng, from, to, kld, n_max);

    let budget = to.max_samples().saturating_sub(to.len()) / hyps.len();
    for hyp in hyps {
        let cov = hyp_cov(hyp);
        for _ in 0..budget {
            if to.len() >= to.max_samples() {
                break;
            }
            let pose = sample_gaussian(rng, &hyp.mean, &cov, HeadingSpread::Uniform);
            if !map.is_free(pose.x, pose.y) {
                continue;
            }
            to.push(Sample::new(pose, 1.0));
            to.tree.insert(&pose, 1.0);
        }
    }

    finish(to);
    to.len()
}

/// Per-hypothesis KLD cutoff variant of [`resample_hyps`] (spec §4.4.4,
/// §9): skips the shared baseline resample entirely and splits
/// `max_samples` evenly across `hyps`. Each hypothesis first receives an
/// unconditional minimum of `min(10, budget)` draws, then continues
/// drawing — up to its own `budget` — until a secondary KLD cutoff fires
/// against that hypothesis's *own* histogram, computed with `pop_err`
/// scaled `5x` looser than the filter's ordinary KLD parameters (a
/// per-hypothesis cloud is expected to be far tighter than the whole
/// population, so the ordinary `pop_err` would cut it off almost
/// immediately). `theta` is drawn directly from a uniform distribution
/// (behaviorally the same as the upstream system's "draw from the
/// hypothesis, then replace theta with a uniform draw at transfer time",
/// just without the discarded intermediate value).
pub fn resample_hyps_3(rng: &mut impl Rng, to: &mut SampleSet, hyps: &[Hypothesis], kld: &KldParams) -> usize {
    to.clear_for_rebuild();
    if hyps.is_empty() {
        return 0;
    }

    let budget = to.max_samples() / hyps.len();
    let secondary = KldParams { pop_err: kld.pop_err * 5.0, pop_z: kld.pop_z, min_samples: 0, max_samples: budget };

    for hyp in hyps {
        if budget == 0 || to.len() >= to.max_samples() {
            continue;
        }
        let cov = hyp_cov(hyp);
        let mut local_tree = KdTree::with_capacity(3 * budget.max(1));
        let floor = budget.min(10);
        let mut drawn = 0usize;

        while drawn < floor && to.len() < to.max_samples() {
            let pose = sample_gaussian(rng, &hyp.mean, &cov, HeadingSpread::Uniform);
            to.push(Sample::new(pose, 1.0));
            to.tree.insert(&pose, 1.0);
            local_tree.insert(&pose, 1.0);
            drawn += 1;
        }

        while drawn < budget && to.len() < to.max_samples() {
            let pose = sample_gaussian(rng, &hyp.mean, &cov, HeadingSpread::Uniform);
            to.push(Sample::new(pose, 1.0));
            to.tree.insert(&pose, 1.0);
            local_tree.insert(&pose, 1.0);
            drawn += 1;

            let k = local_tree.leaf_count();
            if drawn >= resample_limit(k, &secondary) {
                break;
            }
        }
    }

    finish(to);
    to.len()
}

/// Experimental variant (spec §9 Open Question — kept as a distinct,
/// explicitly-labeled entry point rather than folded into
/// [`resample_hyps`], since its behavior has not been validated against
/// the upstream system this crate reimplements and may change or be
/// removed). Unlike every other resampler here, this one mutates `from` in
/// place: it overwrites up to `hyps.len()` of `from`'s existing samples
/// with fresh hypothesis-guided draws, resets every weight in `from` to
/// uniform, and then hands off to ordinary [`resample`]. Not wired into
/// the default control flow.
pub fn resample_hyps_2(
    rng: &mut impl Rng,
    from: &mut SampleSet,
    to: &mut SampleSet,
    hyps: &[Hypothesis],
    kld: &KldParams,
) -> usize {
    let inject = hyps.len().min(from.len());
    for (slot, hyp) in from.samples_mut().iter_mut().take(inject).zip(hyps) {
        let cov = hyp_cov(hyp);
        slot.pose = sample_gaussian(rng, &hyp.mean, &cov, HeadingSpread::Gaussian);
    }
    from.set_uniform_weights();
    from.rebuild_histogram();

    resample(rng, from, to, kld)
}

fn finish(to: &mut SampleSet) {
    let total: f64 = to.samples().iter().map(|s| s.weight).sum();
    if total > 0.0 {
        to.normalize_weights(total);
    } else {
        to.set_uniform_weights();
    }
    to.compute_cluster_stats();
    #[cfg(feature = "tracing")]
    tracing::debug!(n = to.len(), clusters = to.num_clusters(), "resample complete");
}
